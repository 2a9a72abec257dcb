//! Services - prediction pipeline and model reload lifecycle

pub mod prediction;
pub mod reload;
pub mod trainer;

pub use prediction::{PredictionError, PredictionService, DEGRADED_LEVEL};
pub use reload::{ReloadController, ReloadError, ReloadOutcome, ReloadState, ReloadStatus};
pub use trainer::{CommandTrainer, TrainError, Trainer};
