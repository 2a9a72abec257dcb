//! Predictor interface
//!
//! Anything that answers `predict()` for a batch of records: either a trained
//! model loaded from an artifact, or the rule-based fallback.

use serde::Serialize;
use thiserror::Error;

use crate::models::MetricsRecord;
use super::scoring::ScoringEngine;

/// Failure inside a model call. Never surfaced to API callers.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model returned {got} predictions for {expected} records")]
    WrongShape { expected: usize, got: usize },

    #[error("prediction out of range: {0}")]
    OutOfRange(i64),

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Trained,
    Fallback,
}

/// Trait for prediction models
pub trait Predictor: Send + Sync {
    /// Raw class labels, one per record. Range checks happen in the caller.
    fn predict(&self, batch: &[MetricsRecord]) -> Result<Vec<i64>, PredictError>;

    fn kind(&self) -> ModelKind;

    fn name(&self) -> String;
}

/// Deterministic fallback backed by the scoring engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedFallback {
    engine: ScoringEngine,
}

impl RuleBasedFallback {
    pub fn new() -> Self {
        Self { engine: ScoringEngine::new() }
    }
}

impl Predictor for RuleBasedFallback {
    fn predict(&self, batch: &[MetricsRecord]) -> Result<Vec<i64>, PredictError> {
        Ok(batch
            .iter()
            .map(|r| i64::from(self.engine.score(r).1.as_u8()))
            .collect())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Fallback
    }

    fn name(&self) -> String {
        "rule-based".to_string()
    }
}
