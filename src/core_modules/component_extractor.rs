// THEORY:
// The `ComponentExtractor` turns one color bin (a scattered list of pixels that share
// a quantized color) into spatially coherent pieces. Two pixels of the same bin only
// belong to the same candidate shadow patch if they touch.
//
// Key architectural principles:
// 1.  **External Primitive**: The actual connectivity labeling is not implemented
//     here. It is delegated to a `ConnectivityLabeler`, with `imageproc`'s
//     8-connected labeling as the default.
// 2.  **Serialized Entry**: Labeling primitives of this kind may run internally
//     parallel code and are not assumed safe to enter from several workers at once.
//     Every call goes through one process-wide lock, `LABELING_LOCK`. It is separate
//     from the lock guarding shadow results, and the two are never held together.
// 3.  **Single Pass Grouping**: After labeling, the bin's own pixel list is walked
//     once and each pixel is dropped into its label's bucket. The label image is
//     never rescanned per label.
// 4.  **Loud Inconsistencies**: A label with no pixels, or a bin pixel the labeler
//     left as background, means the primitive and the bin disagree. That is returned
//     as an error for this bin instead of being silently skipped.

use crate::core_modules::error::{ShadowError, ShadowResult};
use crate::core_modules::lab_planes::PixelCoordinate;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::sync::{Arc, Mutex, PoisonError};

/// Process-wide critical section around every connectivity labeling call.
static LABELING_LOCK: Mutex<()> = Mutex::new(());

/// Per-pixel component ids. 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// The output of a connectivity labeling call.
#[derive(Debug, Clone)]
pub struct Labeling {
    /// Number of foreground components. Labels run from 1 to `component_count`.
    pub component_count: u32,
    pub labels: LabelImage,
}

/// Assigns a shared integer id to every group of connected foreground pixels.
pub trait ConnectivityLabeler: Send + Sync {
    fn label(&self, binary: &GrayImage) -> Labeling;
}

/// 8-connected labeling backed by `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocLabeler;

impl ConnectivityLabeler for ImageprocLabeler {
    fn label(&self, binary: &GrayImage) -> Labeling {
        let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));
        let component_count = labels.pixels().map(|p| p[0]).max().unwrap_or(0);
        Labeling {
            component_count,
            labels,
        }
    }
}

/// A group of touching pixels from one color bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedComponent {
    pub label: u32,
    pub pixels: Vec<PixelCoordinate>,
}

impl ConnectedComponent {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Splits bins into connected components through a shared labeler.
#[derive(Clone)]
pub struct ComponentExtractor {
    labeler: Arc<dyn ConnectivityLabeler>,
}

impl Default for ComponentExtractor {
    fn default() -> Self {
        Self::new(Arc::new(ImageprocLabeler))
    }
}

impl ComponentExtractor {
    pub fn new(labeler: Arc<dyn ConnectivityLabeler>) -> Self {
        Self { labeler }
    }

    /// Returns the components of `pixels` ordered by label (1..N). Each component's
    /// pixels keep the order they had in `pixels`.
    pub fn extract(
        &self,
        pixels: &[PixelCoordinate],
        width: u32,
        height: u32,
    ) -> ShadowResult<Vec<ConnectedComponent>> {
        if pixels.is_empty() {
            return Ok(Vec::new());
        }

        let mut binary = GrayImage::new(width, height);
        for p in pixels {
            binary.put_pixel(p.col, p.row, Luma([255]));
        }

        let labeling = {
            let _guard = LABELING_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            self.labeler.label(&binary)
        };

        let mut grouped: Vec<Vec<PixelCoordinate>> =
            vec![Vec::new(); labeling.component_count as usize];
        for p in pixels {
            let label = labeling.labels.get_pixel(p.col, p.row)[0];
            if label == 0 || label > labeling.component_count {
                return Err(ShadowError::LabelingInconsistent {
                    row: p.row,
                    col: p.col,
                    label,
                });
            }
            grouped[(label - 1) as usize].push(*p);
        }

        grouped
            .into_iter()
            .zip(1u32..)
            .map(|(pixels, label)| {
                if pixels.is_empty() {
                    Err(ShadowError::EmptyComponent { label })
                } else {
                    Ok(ConnectedComponent { label, pixels })
                }
            })
            .collect()
    }
}
