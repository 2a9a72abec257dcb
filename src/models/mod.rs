//! Data models

pub mod metrics;
pub mod prediction;

pub use metrics::*;
pub use prediction::*;
