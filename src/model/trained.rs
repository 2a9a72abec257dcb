//! Trained model - ONNX classifier exported by the training job
//!
//! The artifact is a single ONNX graph taking `float[N, 13]` (features in
//! `EXPECTED_FIELDS` order) and returning integer class labels. Categorical
//! columns are label-encoded with the category lists the training job writes
//! next to the model as `<model>.encoders.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use thiserror::Error;

use crate::models::{FieldValue, MetricsRecord, EXPECTED_FIELDS};
use super::predictor::{ModelKind, PredictError, Predictor};

/// Encoded value for categories the encoder never saw
pub const UNKNOWN_CATEGORY: f32 = -1.0;

/// Output holding class labels in skl2onnx classifiers
const LABEL_OUTPUT: &str = "label";

/// Category lists per column; the index of a category is its encoded value
pub type LabelEncoders = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse label encoders: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to load ONNX model: {0}")]
    Session(String),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

pub struct TrainedModel {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    label_output: String,
    encoders: LabelEncoders,
    source: String,
}

impl TrainedModel {
    /// Load the ONNX artifact and its encoders, or report why it is unusable
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }

        let encoders = load_encoders(&encoders_path(path))?;

        let session = Session::builder()
            .map_err(|e| ArtifactError::Session(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ArtifactError::Session(format!("optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ArtifactError::Session(e.to_string()))?;

        let model = Self::from_session(session, encoders, path.display().to_string())?;
        tracing::info!(
            "Loaded trained model from {} ({} encoded columns)",
            path.display(),
            model.encoders.len()
        );
        Ok(model)
    }

    /// Load from bytes already in memory
    pub fn from_bytes(
        bytes: &[u8],
        encoders: LabelEncoders,
        source: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let session = Session::builder()
            .map_err(|e| ArtifactError::Session(format!("session builder: {}", e)))?
            .commit_from_memory(bytes)
            .map_err(|e| ArtifactError::Session(e.to_string()))?;

        Self::from_session(session, encoders, source.into())
    }

    fn from_session(
        session: Session,
        encoders: LabelEncoders,
        source: String,
    ) -> Result<Self, ArtifactError> {
        if session.inputs.len() != 1 {
            return Err(ArtifactError::Invalid(format!(
                "expected one input tensor, found {}",
                session.inputs.len()
            )));
        }

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name == LABEL_OUTPUT)
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::Invalid("no outputs defined".into()))?;

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            encoders,
            source,
        })
    }

    /// Feature matrix in schema order, one row per record
    fn features(&self, batch: &[MetricsRecord]) -> Result<Array2<f32>, PredictError> {
        let mut data = Vec::with_capacity(batch.len() * EXPECTED_FIELDS.len());
        for record in batch {
            for field in EXPECTED_FIELDS {
                data.push(encode_feature(record.get(field), self.encoders.get(field)));
            }
        }

        Array2::from_shape_vec((batch.len(), EXPECTED_FIELDS.len()), data)
            .map_err(|e| PredictError::Inference(format!("Array error: {}", e)))
    }
}

impl Predictor for TrainedModel {
    fn predict(&self, batch: &[MetricsRecord]) -> Result<Vec<i64>, PredictError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let input_tensor = Value::from_array(self.features(batch)?)
            .map_err(|e| PredictError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PredictError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| PredictError::Malformed(format!("no output named {}", self.label_output)))?;

        let labels = output
            .try_extract_tensor::<i64>()
            .map_err(|e| PredictError::Malformed(format!("label output: {}", e)))?
            .1;

        Ok(labels.to_vec())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Trained
    }

    fn name(&self) -> String {
        format!("onnx ({})", self.source)
    }
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("source", &self.source)
            .field("label_output", &self.label_output)
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// `model.onnx` -> `model.encoders.json`
pub fn encoders_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("encoders.json")
}

/// A missing sidecar means the model has no categorical columns
fn load_encoders(path: &Path) -> Result<LabelEncoders, ArtifactError> {
    if !path.exists() {
        return Ok(LabelEncoders::new());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Numeric value for one feature column
fn encode_feature(value: Option<&FieldValue>, encoder: Option<&Vec<String>>) -> f32 {
    match (value, encoder) {
        (None, _) => 0.0,
        (Some(FieldValue::Text(s)), Some(categories)) => {
            if let Ok(n) = s.trim().parse::<f64>() {
                return if n.is_finite() { n as f32 } else { 0.0 };
            }
            categories
                .iter()
                .position(|c| c == s)
                .map(|i| i as f32)
                .unwrap_or(UNKNOWN_CATEGORY)
        }
        (Some(v), _) => v.as_f64() as f32,
    }
}
