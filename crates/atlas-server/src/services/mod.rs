//! Business logic services

pub mod reconciler;
pub mod summary;

pub use reconciler::{Reconciler, UniformMultiplier};
pub use summary::SummaryRenderer;
