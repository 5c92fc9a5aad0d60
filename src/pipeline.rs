// THEORY:
// The `pipeline` module is the top-level API of the shadow engine. It wires the
// stages together behind one call and owns the boundary checks. By the time any
// parallel work starts, the steps, the worker count and every plane and mask
// dimension have been validated. A bad input aborts the whole call with no partial
// result.
//
// Stages:
// 1.  Validation: config and input shapes.
// 2.  Color binning: foreground pixels → {bin key → pixels}.
// 3.  Parallel bin processing: components → borders → shadow decision.
// 4.  Aggregation: the shared shadow set is drained into a sorted `ShadowReport`.

use crate::core_modules::color_binner::{self, ColorBins, QuantizationMode, QuantizationSteps};
use crate::core_modules::component_extractor::{ComponentExtractor, ConnectivityLabeler};
use crate::core_modules::error::ShadowResult;
use crate::core_modules::foreground;
use crate::core_modules::lab_planes::{LabPlanes, PixelCoordinate};
use crate::core_modules::observer::{BinObserver, BinReport, TracingObserver};
use crate::core_modules::shadow_points::{self, ShadowPointSet};
use crate::parallel_pipeline::{BinContext, BinFailure, BinWorkerPool, Scheduling};
use image::GrayImage;
use std::sync::Arc;

/// Configuration for the ShadowPipeline.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Quantization step of the lightness channel. Must be positive.
    pub l_step: i32,
    /// Quantization step of the a* channel. Must be positive.
    pub a_step: i32,
    /// Quantization step of the b* channel. Must be positive.
    pub b_step: i32,
    pub quantization_mode: QuantizationMode,
    /// Maximum number of bins processed at the same time.
    pub worker_count: usize,
    pub scheduling: Scheduling,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            l_step: 10,
            a_step: 10,
            b_step: 10,
            quantization_mode: QuantizationMode::default(),
            worker_count: num_cpus::get(),
            scheduling: Scheduling::default(),
        }
    }
}

impl DetectorConfig {
    /// Validated quantization steps.
    pub fn steps(&self) -> ShadowResult<QuantizationSteps> {
        let steps = QuantizationSteps::new(self.l_step, self.a_step, self.b_step)?;
        Ok(steps.with_mode(self.quantization_mode))
    }
}

/// The outcome of one detection run.
#[derive(Debug, Clone)]
pub struct ShadowReport {
    pub width: u32,
    pub height: u32,
    /// Shadow pixels, sorted by (row, col), without duplicates.
    pub shadow_points: Vec<PixelCoordinate>,
    pub foreground_pixel_count: usize,
    pub bin_reports: Vec<BinReport>,
    /// Bins that were aborted. Their pixels are absent from `shadow_points`.
    pub failed_bins: Vec<BinFailure>,
}

impl ShadowReport {
    /// True when every bin was processed.
    pub fn is_complete(&self) -> bool {
        self.failed_bins.is_empty()
    }

    pub fn bin_count(&self) -> usize {
        self.bin_reports.len() + self.failed_bins.len()
    }

    pub fn render_mask(&self) -> GrayImage {
        shadow_points::render_mask(&self.shadow_points, self.width, self.height)
    }
}

/// The main, top-level struct for the shadow engine.
pub struct ShadowPipeline {
    config: DetectorConfig,
    extractor: ComponentExtractor,
    observer: Arc<dyn BinObserver>,
}

impl ShadowPipeline {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            extractor: ComponentExtractor::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the default `imageproc` connectivity labeling.
    pub fn with_labeler(mut self, labeler: Arc<dyn ConnectivityLabeler>) -> Self {
        self.extractor = ComponentExtractor::new(labeler);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BinObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Runs only the color binning stage.
    pub fn bin(&self, planes: &LabPlanes, mask: &GrayImage) -> ShadowResult<ColorBins> {
        color_binner::bin_foreground(mask, planes, &self.config.steps()?)
    }

    /// Classifies the pixels marked in `mask` as shadow or not.
    pub async fn detect(
        &self,
        planes: Arc<LabPlanes>,
        mask: &GrayImage,
    ) -> ShadowResult<ShadowReport> {
        // Stage 1: Validation
        let steps = self.config.steps()?;
        let pool = BinWorkerPool::new(self.config.worker_count, self.config.scheduling)?;

        // Stage 2: Color Binning
        let bins = color_binner::bin_foreground(mask, &planes, &steps)?;
        let foreground_pixel_count = bins.pixel_count();
        self.observer.bins_created(bins.len(), foreground_pixel_count);

        // Stage 3: Parallel Bin Processing
        let shadow_points = Arc::new(ShadowPointSet::new());
        let context = Arc::new(BinContext {
            planes: planes.clone(),
            steps,
            extractor: self.extractor.clone(),
            observer: self.observer.clone(),
            shadow_points: shadow_points.clone(),
        });
        let summary = pool.run(bins, context).await?;

        // Stage 4: Aggregation
        let shadow_points = shadow_points.take_sorted_points();
        tracing::info!(
            "{} shadow pixels out of {} foreground pixels, {} bins failed",
            shadow_points.len(),
            foreground_pixel_count,
            summary.failures.len()
        );

        let (width, height) = planes.dimensions();
        Ok(ShadowReport {
            width,
            height,
            shadow_points,
            foreground_pixel_count,
            bin_reports: summary.reports,
            failed_bins: summary.failures,
        })
    }

    /// Runs `detect` with the mean-lightness foreground mask.
    pub async fn detect_with_mean_light(
        &self,
        planes: Arc<LabPlanes>,
    ) -> ShadowResult<ShadowReport> {
        let mask = foreground::mean_lightness_mask(&planes);
        self.detect(planes, &mask).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::error::ShadowError;
    use crate::core_modules::observer::SilentObserver;
    use image::Luma;

    fn flat_planes(width: u32, height: u32) -> Arc<LabPlanes> {
        Arc::new(
            LabPlanes::new(
                GrayImage::from_pixel(width, height, Luma([50])),
                GrayImage::from_pixel(width, height, Luma([50])),
                GrayImage::from_pixel(width, height, Luma([50])),
            )
            .unwrap(),
        )
    }

    fn quiet(config: DetectorConfig) -> ShadowPipeline {
        ShadowPipeline::new(config).with_observer(Arc::new(SilentObserver))
    }

    #[test]
    fn default_config_uses_every_cpu() {
        let config = DetectorConfig::default();
        assert_eq!(config.worker_count, num_cpus::get());
        assert_eq!((config.l_step, config.a_step, config.b_step), (10, 10, 10));
        assert!(config.steps().is_ok());
    }

    #[test]
    fn pipeline_keeps_its_config() {
        let pipeline = quiet(DetectorConfig {
            worker_count: 2,
            scheduling: Scheduling::Waves,
            quantization_mode: QuantizationMode::Truncate,
            ..DetectorConfig::default()
        });
        let config = pipeline.config();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.scheduling, Scheduling::Waves);
        assert_eq!(config.steps().unwrap().mode(), QuantizationMode::Truncate);
    }

    #[tokio::test]
    async fn invalid_step_aborts_before_binning() {
        let pipeline = quiet(DetectorConfig {
            b_step: -1,
            ..DetectorConfig::default()
        });
        let err = pipeline.detect(flat_planes(4, 4), &GrayImage::new(4, 4)).await.unwrap_err();
        assert_eq!(err, ShadowError::InvalidStep { channel: "b*", value: -1 });
    }

    #[tokio::test]
    async fn zero_workers_aborts() {
        let pipeline = quiet(DetectorConfig {
            worker_count: 0,
            ..DetectorConfig::default()
        });
        let err = pipeline.detect(flat_planes(4, 4), &GrayImage::new(4, 4)).await.unwrap_err();
        assert_eq!(err, ShadowError::InvalidWorkerCount);
    }

    #[tokio::test]
    async fn mismatched_mask_aborts() {
        let pipeline = quiet(DetectorConfig::default());
        let err = pipeline.detect(flat_planes(4, 4), &GrayImage::new(5, 4)).await.unwrap_err();
        assert!(matches!(err, ShadowError::DimensionMismatch { plane: "foreground mask", .. }));
    }

    #[tokio::test]
    async fn empty_mask_yields_empty_report() {
        let pipeline = quiet(DetectorConfig::default());
        let report = pipeline.detect(flat_planes(6, 6), &GrayImage::new(6, 6)).await.unwrap();
        assert!(report.shadow_points.is_empty());
        assert_eq!(report.bin_count(), 0);
        assert!(report.is_complete());
        assert_eq!(report.render_mask().dimensions(), (6, 6));
    }
}
