// THEORY:
// This file is the main entry point for the `umbra_vision` library crate.
// It exposes the `ShadowPipeline` and its associated data structures
// (`DetectorConfig`, `ShadowReport`, etc.) as the high-level interface of the
// shadow engine. The individual stages stay public under `core_modules` for
// callers that only need one of them, such as color binning or border tracing.
//
// The engine works on three 8-bit planes of an L*a*b* image. A foreground mask
// selects the candidate pixels. Candidates are grouped into color bins, each bin
// is split into 8-connected components, and a component is kept as shadow when
// its border contains a lighter pixel of the same quantized chroma.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::error::{ShadowError, ShadowResult};
pub use core_modules::lab_planes::{LabPlanes, PixelCoordinate};
pub use parallel_pipeline::Scheduling;
pub use pipeline::{DetectorConfig, ShadowPipeline, ShadowReport};
