//! Model Module - scoring engine and swappable predictors

pub mod scoring;
pub mod predictor;
pub mod trained;
pub mod handle;

// Re-export common types
pub use scoring::{ScoringEngine, ScoreBreakdown, level_for};
pub use predictor::{ModelKind, PredictError, Predictor, RuleBasedFallback};
pub use trained::{ArtifactError, LabelEncoders, TrainedModel};
pub use handle::{ModelHandle, ModelStatus};

#[cfg(test)]
pub(crate) fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}
