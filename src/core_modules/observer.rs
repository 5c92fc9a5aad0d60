// THEORY:
// Bin workers report what they did through a `BinObserver` rather than printing. The
// engine stays silent and testable, and the embedding application decides whether
// progress ends up in logs, a progress bar, or nowhere.
//
// Observers are called from worker threads, so they must be `Send + Sync`. The
// default `TracingObserver` emits one `tracing` event per bin, and each event is
// written atomically by the subscriber. No extra print lock is needed.

use crate::core_modules::color_binner::ColorBinKey;
use crate::core_modules::error::ShadowError;
use std::time::Duration;

/// What happened while processing one color bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinReport {
    pub key: ColorBinKey,
    pub pixel_count: usize,
    pub component_count: usize,
    pub shadow_component_count: usize,
    pub shadow_pixel_count: usize,
    pub elapsed: Duration,
}

/// Receives progress from the shadow pipeline. All methods default to no-ops.
pub trait BinObserver: Send + Sync {
    fn bins_created(&self, _bin_count: usize, _foreground_pixels: usize) {}
    fn bin_completed(&self, _report: &BinReport) {}
    fn bin_failed(&self, _key: ColorBinKey, _error: &ShadowError) {}
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl BinObserver for SilentObserver {}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BinObserver for TracingObserver {
    fn bins_created(&self, bin_count: usize, foreground_pixels: usize) {
        tracing::info!(
            "{} color bins created from {} foreground pixels",
            bin_count,
            foreground_pixels
        );
    }

    fn bin_completed(&self, report: &BinReport) {
        tracing::debug!(
            "Bin {} -> totPixels: {}, totCC: {}, shadowCC: {}. Done in {} ms",
            report.key,
            report.pixel_count,
            report.component_count,
            report.shadow_component_count,
            report.elapsed.as_millis()
        );
    }

    fn bin_failed(&self, key: ColorBinKey, error: &ShadowError) {
        tracing::warn!("Bin {} aborted: {}", key, error);
    }
}
