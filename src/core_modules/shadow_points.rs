// THEORY:
// `ShadowPointSet` is the only mutable state shared between bin workers. Every worker
// appends the pixels of each component it classified as shadow. Nothing is ever
// removed, and the set is read exactly once, after every worker has finished.
//
// Appends happen one whole component at a time under a single lock acquisition.
// Another worker therefore never observes half of a component, and contention stays
// proportional to the number of shadow components, not shadow pixels.

use crate::core_modules::foreground::MASK_ON;
use crate::core_modules::lab_planes::PixelCoordinate;
use image::{GrayImage, Luma};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct ShadowPointSet {
    points: Mutex<Vec<PixelCoordinate>>,
}

impl ShadowPointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends all pixels of one shadow component atomically.
    pub fn append_component(&self, pixels: &[PixelCoordinate]) {
        if pixels.is_empty() {
            return;
        }
        let mut points = self.points.lock().unwrap_or_else(PoisonError::into_inner);
        points.extend_from_slice(pixels);
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the set, returning its points sorted and without duplicates.
    pub fn take_sorted_points(&self) -> Vec<PixelCoordinate> {
        let mut guard = self.points.lock().unwrap_or_else(PoisonError::into_inner);
        let mut points = std::mem::take(&mut *guard);
        drop(guard);
        points.sort_unstable();
        points.dedup();
        points
    }
}

/// Renders `points` into a binary mask: shadow pixels are `MASK_ON`, all others 0.
/// Points outside the given dimensions are ignored.
pub fn render_mask(points: &[PixelCoordinate], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for p in points {
        if p.row < height && p.col < width {
            mask.put_pixel(p.col, p.row, Luma([MASK_ON]));
        }
    }
    mask
}
