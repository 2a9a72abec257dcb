//! Prediction service
//!
//! Validates a raw payload, runs it through whichever model is loaded and
//! shapes the response. Model failures degrade to a medium-risk answer;
//! only bad input and a missing model reach the caller as errors.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::{ModelHandle, PredictError, Predictor};
use crate::models::{missing_fields, MetricsRecord, PredictionResponse, RiskLevel};
use crate::prediction_log::PredictionLog;

/// Level returned when the model call fails
pub const DEGRADED_LEVEL: RiskLevel = RiskLevel::Medium;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{message}")]
    Validation {
        message: String,
        missing: Option<Vec<String>>,
    },

    #[error("Model not loaded")]
    ModelUnavailable,
}

impl PredictionError {
    fn malformed() -> Self {
        PredictionError::Validation {
            message: "Malformed input".to_string(),
            missing: None,
        }
    }
}

#[derive(Debug)]
pub struct PredictionService {
    handle: Arc<ModelHandle>,
    strict_schema: bool,
    log: Option<PredictionLog>,
}

impl PredictionService {
    pub fn new(handle: Arc<ModelHandle>, strict_schema: bool) -> Self {
        Self {
            handle,
            strict_schema,
            log: None,
        }
    }

    pub fn with_log(mut self, log: PredictionLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    /// Predict from a raw request body
    pub fn predict_bytes(&self, body: &[u8]) -> Result<PredictionResponse, PredictionError> {
        if self.handle.snapshot().is_none() {
            return Err(PredictionError::ModelUnavailable);
        }

        let payload: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!("Rejecting unparseable payload: {}", e);
            PredictionError::malformed()
        })?;
        self.predict(&payload)
    }

    /// Predict from a parsed JSON payload
    pub fn predict(&self, payload: &Value) -> Result<PredictionResponse, PredictionError> {
        // One snapshot for the whole call, even if a reload lands meanwhile
        let model = self.handle.snapshot().ok_or(PredictionError::ModelUnavailable)?;

        let object = payload.as_object().ok_or_else(PredictionError::malformed)?;

        if self.strict_schema {
            let missing = missing_fields(object);
            if !missing.is_empty() {
                return Err(PredictionError::Validation {
                    message: "Missing fields".to_string(),
                    missing: Some(missing),
                });
            }
        }

        let record = MetricsRecord::from_json(object).unwrap_or_else(|e| {
            tracing::warn!("Payload is not a flat record ({}), using canonical default", e);
            MetricsRecord::canonical_default()
        });

        let level = match run_model(model.as_ref(), &record) {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!("Prediction failed on {}: {}; answering {}", model.name(), e, DEGRADED_LEVEL);
                DEGRADED_LEVEL
            }
        };

        if let Some(log) = &self.log {
            if let Err(e) = log.append(&record, level) {
                tracing::warn!("Failed to append to prediction log {}: {}", log.path().display(), e);
            }
        }

        Ok(PredictionResponse::from_level(level))
    }
}

/// Single-record batch through the model, with every failure mode as an error
fn run_model(model: &dyn Predictor, record: &MetricsRecord) -> Result<RiskLevel, PredictError> {
    let batch = std::slice::from_ref(record);

    let output = panic::catch_unwind(AssertUnwindSafe(|| model.predict(batch)))
        .map_err(|payload| PredictError::Panicked(panic_message(payload.as_ref())))??;

    match output.as_slice() {
        [raw] => RiskLevel::try_from(*raw).map_err(|_| PredictError::OutOfRange(*raw)),
        other => Err(PredictError::WrongShape { expected: 1, got: other.len() }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
