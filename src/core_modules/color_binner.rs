// THEORY:
// The `ColorBinner` is the first stage of shadow refinement. It takes every pixel the
// foreground mask marks as a shadow candidate and drops it into a discrete color bin,
// keyed by the quantized values of its three L*a*b* channels.
//
// Key architectural principles:
// 1.  **Quantization as Noise Tolerance**: Dividing each channel by a fixed step
//     collapses small variations in color (sensor noise, residual texture after
//     filtering) into a single bin. Two pixels on the same physical surface should
//     land in the same bin even if their raw values differ slightly.
// 2.  **Exact Partition**: Every foreground pixel lands in exactly one bin. The
//     binner counts both sides and refuses to hand over a map that violates this.
// 3.  **Shared Quantizer**: The same `QuantizationSteps` is used again by the
//     `ShadowClassifier` when it quantizes border pixels, so component keys and
//     border keys are always directly comparable.

use crate::core_modules::error::{ShadowError, ShadowResult};
use crate::core_modules::lab_planes::{LabPlanes, LabSample, PixelCoordinate};
use image::GrayImage;
use std::collections::HashMap;
use std::collections::hash_map;

/// How a raw channel value is divided by its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantizationMode {
    /// `ceil(value / step)`.
    #[default]
    Ceil,
    /// `floor(value / step)`, i.e. plain integer division.
    Truncate,
}

/// Strictly positive step sizes for the L*, a* and b* channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationSteps {
    l_step: u32,
    a_step: u32,
    b_step: u32,
    mode: QuantizationMode,
}

impl QuantizationSteps {
    pub fn new(l_step: i32, a_step: i32, b_step: i32) -> ShadowResult<Self> {
        Ok(Self {
            l_step: Self::validate("lightness", l_step)?,
            a_step: Self::validate("a*", a_step)?,
            b_step: Self::validate("b*", b_step)?,
            mode: QuantizationMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: QuantizationMode) -> Self {
        self.mode = mode;
        self
    }

    fn validate(channel: &'static str, value: i32) -> ShadowResult<u32> {
        if value <= 0 {
            return Err(ShadowError::InvalidStep { channel, value });
        }
        Ok(value as u32)
    }

    pub fn mode(&self) -> QuantizationMode {
        self.mode
    }

    #[inline]
    fn quantize_channel(&self, value: u8, step: u32) -> u32 {
        match self.mode {
            QuantizationMode::Ceil => (value as u32).div_ceil(step),
            QuantizationMode::Truncate => value as u32 / step,
        }
    }

    /// Maps a raw L*a*b* sample onto its bin key.
    #[inline]
    pub fn quantize(&self, sample: LabSample) -> ColorBinKey {
        ColorBinKey {
            l: self.quantize_channel(sample.l, self.l_step),
            a: self.quantize_channel(sample.a, self.a_step),
            b: self.quantize_channel(sample.b, self.b_step),
        }
    }
}

/// The quantized (L, A, B) coordinates shared by every pixel of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorBinKey {
    pub l: u32,
    pub a: u32,
    pub b: u32,
}

impl std::fmt::Display for ColorBinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.l, self.a, self.b)
    }
}

/// Foreground pixels grouped by color bin.
#[derive(Debug, Clone, Default)]
pub struct ColorBins {
    bins: HashMap<ColorBinKey, Vec<PixelCoordinate>>,
}

impl ColorBins {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn get(&self, key: &ColorBinKey) -> Option<&[PixelCoordinate]> {
        self.bins.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, ColorBinKey, Vec<PixelCoordinate>> {
        self.bins.iter()
    }

    /// Total number of pixels across all bins.
    pub fn pixel_count(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }
}

impl IntoIterator for ColorBins {
    type Item = (ColorBinKey, Vec<PixelCoordinate>);
    type IntoIter = hash_map::IntoIter<ColorBinKey, Vec<PixelCoordinate>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.into_iter()
    }
}

/// Groups every nonzero pixel of `mask` into its color bin. Pixels are visited in
/// row-major order, so each bin's list is row-major as well.
pub fn bin_foreground(
    mask: &GrayImage,
    planes: &LabPlanes,
    steps: &QuantizationSteps,
) -> ShadowResult<ColorBins> {
    planes.ensure_mask_matches(mask)?;

    let mut bins: HashMap<ColorBinKey, Vec<PixelCoordinate>> = HashMap::new();
    let mut foreground = 0usize;
    for (col, row, value) in mask.enumerate_pixels() {
        if value[0] == 0 {
            continue;
        }
        foreground += 1;
        let point = PixelCoordinate::new(row, col);
        let key = steps.quantize(planes.sample(point));
        bins.entry(key).or_default().push(point);
    }

    let bins = ColorBins { bins };
    let binned = bins.pixel_count();
    if binned != foreground {
        return Err(ShadowError::BinPartitionMismatch { binned, foreground });
    }
    Ok(bins)
}
