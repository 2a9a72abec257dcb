//! Model handle - the model currently answering predictions
//!
//! Readers take a snapshot (`Arc` clone) once per prediction; reloads replace
//! the whole pointer. A model is never mutated in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::predictor::{ModelKind, Predictor};

/// Status for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub kind: Option<ModelKind>,
    pub name: Option<String>,
    pub version: u64,
}

#[derive(Default)]
pub struct ModelHandle {
    current: RwLock<Option<Arc<dyn Predictor>>>,
    version: AtomicU64,
}

impl ModelHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(model: Arc<dyn Predictor>) -> Self {
        let handle = Self::default();
        handle.swap(model);
        handle
    }

    /// Current model, if any
    pub fn snapshot(&self) -> Option<Arc<dyn Predictor>> {
        self.current.read().clone()
    }

    /// Install a new model, returning the new version number
    pub fn swap(&self, model: Arc<dyn Predictor>) -> u64 {
        let mut current = self.current.write();
        *current = Some(model);
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn status(&self) -> ModelStatus {
        let model = self.snapshot();
        ModelStatus {
            loaded: model.is_some(),
            kind: model.as_ref().map(|m| m.kind()),
            name: model.as_ref().map(|m| m.name()),
            version: self.version(),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("status", &self.status())
            .finish()
    }
}
