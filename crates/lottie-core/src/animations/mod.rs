//! Per-property animation setup for compiled nodes.

mod gradient;
mod paint;
mod paths;
mod transform;
mod visibility;

pub(crate) use gradient::GradientSource;
pub(crate) use paint::StrokeStyle;
pub use paths::PathMultiplier;
