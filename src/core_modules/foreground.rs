// THEORY:
// The foreground mask decides which pixels are even considered as shadow candidates.
// The engine accepts any mask, but ships the simple "background light" heuristic it
// was designed around. The mean lightness of the whole (filtered) lightness plane is
// treated as the light level of the scene. Any pixel darker than that level is
// "probably shadow", and every other pixel is "surely not shadow".
//
// The mask over-selects. The color-bin refinement that follows throws away dark
// objects and keeps only patches that border a lit version of their own surface.

use crate::core_modules::lab_planes::LabPlanes;
use image::{GrayImage, Luma};

/// Value written into masks for marked pixels.
pub const MASK_ON: u8 = 255;

/// Mean value of the lightness plane. Returns 0.0 for an empty image.
pub fn mean_lightness(planes: &LabPlanes) -> f64 {
    let lightness = planes.lightness();
    let count = lightness.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = lightness.as_raw().iter().map(|&v| v as u64).sum();
    sum as f64 / count as f64
}

/// Marks every pixel whose lightness is strictly below the mean lightness, rounded
/// half to even.
pub fn mean_lightness_mask(planes: &LabPlanes) -> GrayImage {
    let threshold = mean_lightness(planes).round_ties_even();
    let lightness = planes.lightness();
    GrayImage::from_fn(planes.width(), planes.height(), |x, y| {
        if (lightness.get_pixel(x, y)[0] as f64) < threshold {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Number of nonzero pixels in `mask`.
pub fn marked_pixel_count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planes_with_lightness(lightness: GrayImage) -> LabPlanes {
        let (w, h) = lightness.dimensions();
        LabPlanes::new(lightness, GrayImage::new(w, h), GrayImage::new(w, h)).unwrap()
    }

    #[test]
    fn marks_only_pixels_darker_than_mean() {
        // Values 0, 10, 20, 30 -> mean 15.
        let lightness = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 10) as u8]));
        let planes = planes_with_lightness(lightness);
        assert_eq!(mean_lightness(&planes), 15.0);

        let mask = mean_lightness_mask(&planes);
        let marked: Vec<u8> = mask.as_raw().clone();
        assert_eq!(marked, vec![MASK_ON, MASK_ON, 0, 0]);
        assert_eq!(marked_pixel_count(&mask), 2);
    }

    #[test]
    fn half_way_mean_rounds_to_even() {
        // Values 14 and 15 -> mean 14.5 -> threshold 14, so 14 is not below it.
        let lightness = GrayImage::from_fn(2, 1, |x, _| Luma([14 + x as u8]));
        let planes = planes_with_lightness(lightness);
        assert_eq!(mean_lightness(&planes), 14.5);
        assert_eq!(marked_pixel_count(&mean_lightness_mask(&planes)), 0);

        // Values 15 and 16 -> mean 15.5 -> threshold 16, so 15 is marked.
        let lightness = GrayImage::from_fn(2, 1, |x, _| Luma([15 + x as u8]));
        let planes = planes_with_lightness(lightness);
        assert_eq!(mean_lightness_mask(&planes).as_raw(), &vec![MASK_ON, 0]);
    }

    #[test]
    fn uniform_image_has_empty_mask() {
        let planes = planes_with_lightness(GrayImage::from_pixel(5, 5, Luma([128])));
        assert_eq!(marked_pixel_count(&mean_lightness_mask(&planes)), 0);
    }

    #[test]
    fn empty_image_has_zero_mean() {
        let planes = planes_with_lightness(GrayImage::new(0, 0));
        assert_eq!(mean_lightness(&planes), 0.0);
        assert_eq!(marked_pixel_count(&mean_lightness_mask(&planes)), 0);
    }
}
