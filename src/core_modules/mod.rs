pub mod border_tracer;
pub mod color_binner;
pub mod component_extractor;
pub mod error;
pub mod foreground;
pub mod lab_planes;
pub mod observer;
pub mod shadow_classifier;
pub mod shadow_points;
