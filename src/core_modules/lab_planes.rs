// THEORY:
// `LabPlanes` is the read-only input of the whole engine: the lightness plane and
// the two chroma planes of an already converted and filtered L*a*b* image. Every
// other module reads pixels through it, so it is also the single place where the
// "all planes share one size" rule is enforced.
//
// Key architectural principles:
// 1.  **Validated Once**: Dimensions are checked at construction. Once a
//     `LabPlanes` exists, no downstream module needs to re-check bounds between
//     planes.
// 2.  **Shared, Never Mutated**: During the parallel phase the planes are wrapped
//     in an `Arc` and read concurrently by every bin worker. Nothing writes to them.
// 3.  **Row/Column Addressing**: The engine speaks in `(row, col)` coordinates.
//     The `image` crate speaks in `(x, y)`. The translation happens here and only here.

use crate::core_modules::error::{ShadowError, ShadowResult};
use image::GrayImage;

/// A single pixel position, addressed as (row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelCoordinate {
    pub row: u32,
    pub col: u32,
}

impl PixelCoordinate {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// True when the pixel lies on the first or last row or column.
    pub fn is_on_image_edge(&self, width: u32, height: u32) -> bool {
        self.row == 0 || self.col == 0 || self.row + 1 >= height || self.col + 1 >= width
    }
}

/// The raw L*, a*, b* values of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabSample {
    pub l: u8,
    pub a: u8,
    pub b: u8,
}

/// The three equally sized channel planes of an L*a*b* image.
#[derive(Debug, Clone)]
pub struct LabPlanes {
    lightness: GrayImage,
    chroma_a: GrayImage,
    chroma_b: GrayImage,
}

impl LabPlanes {
    pub fn new(
        lightness: GrayImage,
        chroma_a: GrayImage,
        chroma_b: GrayImage,
    ) -> ShadowResult<Self> {
        let expected = lightness.dimensions();
        for (plane, image) in [("a*", &chroma_a), ("b*", &chroma_b)] {
            if image.dimensions() != expected {
                return Err(ShadowError::DimensionMismatch {
                    plane,
                    expected,
                    actual: image.dimensions(),
                });
            }
        }
        Ok(Self {
            lightness,
            chroma_a,
            chroma_b,
        })
    }

    pub fn width(&self) -> u32 {
        self.lightness.width()
    }

    pub fn height(&self) -> u32 {
        self.lightness.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.lightness.dimensions()
    }

    pub fn lightness(&self) -> &GrayImage {
        &self.lightness
    }

    /// Reads all three channels at `point`. Panics if `point` is out of bounds,
    /// like `GrayImage::get_pixel`.
    #[inline]
    pub fn sample(&self, point: PixelCoordinate) -> LabSample {
        LabSample {
            l: self.lightness.get_pixel(point.col, point.row)[0],
            a: self.chroma_a.get_pixel(point.col, point.row)[0],
            b: self.chroma_b.get_pixel(point.col, point.row)[0],
        }
    }

    /// Confirms that `mask` covers exactly the same area as the planes.
    pub fn ensure_mask_matches(&self, mask: &GrayImage) -> ShadowResult<()> {
        if mask.dimensions() != self.dimensions() {
            return Err(ShadowError::DimensionMismatch {
                plane: "foreground mask",
                expected: self.dimensions(),
                actual: mask.dimensions(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn rejects_chroma_plane_of_different_size() {
        let l = GrayImage::new(4, 3);
        let a = GrayImage::new(4, 3);
        let b = GrayImage::new(3, 4);
        let err = LabPlanes::new(l, a, b).unwrap_err();
        assert_eq!(
            err,
            ShadowError::DimensionMismatch {
                plane: "b*",
                expected: (4, 3),
                actual: (3, 4),
            }
        );
    }

    #[test]
    fn samples_use_row_col_addressing() {
        let mut l = GrayImage::new(3, 2);
        l.put_pixel(2, 1, Luma([90]));
        let planes = LabPlanes::new(l, GrayImage::new(3, 2), GrayImage::new(3, 2)).unwrap();
        assert_eq!(planes.sample(PixelCoordinate::new(1, 2)).l, 90);
        assert_eq!(planes.sample(PixelCoordinate::new(0, 0)).l, 0);
    }

    #[test]
    fn edge_detection_covers_all_four_sides() {
        let (w, h) = (5, 4);
        assert!(PixelCoordinate::new(0, 2).is_on_image_edge(w, h));
        assert!(PixelCoordinate::new(3, 2).is_on_image_edge(w, h));
        assert!(PixelCoordinate::new(2, 0).is_on_image_edge(w, h));
        assert!(PixelCoordinate::new(2, 4).is_on_image_edge(w, h));
        assert!(!PixelCoordinate::new(1, 1).is_on_image_edge(w, h));
        assert!(!PixelCoordinate::new(2, 3).is_on_image_edge(w, h));
    }

    #[test]
    fn mask_of_other_size_is_rejected() {
        let square = || GrayImage::new(2, 2);
        let planes = LabPlanes::new(square(), square(), square()).unwrap();
        assert!(planes.ensure_mask_matches(&GrayImage::new(2, 2)).is_ok());
        assert!(matches!(
            planes.ensure_mask_matches(&GrayImage::new(2, 3)),
            Err(ShadowError::DimensionMismatch { plane: "foreground mask", .. })
        ));
    }
}
