//! Model reload lifecycle
//!
//! `Idle -> Training -> Idle`. Each retrain request becomes a background job
//! that runs the trainer, loads the fresh artifact and swaps it into the
//! model handle. A failed job leaves the current model in place; when jobs
//! overlap, the last one to succeed wins.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::model::{ArtifactError, ModelHandle, TrainedModel};
use super::trainer::{TrainError, Trainer};

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Load(#[from] ArtifactError),

    #[error("reload task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadState {
    Idle,
    Training,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub succeeded: bool,
    pub message: String,
    pub model_version: Option<u64>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadStatus {
    pub state: ReloadState,
    pub in_flight: usize,
    pub last_outcome: Option<ReloadOutcome>,
}

struct Shared {
    handle: Arc<ModelHandle>,
    trainer: Arc<dyn Trainer>,
    model_path: PathBuf,
    in_flight: AtomicUsize,
    last_outcome: Mutex<Option<ReloadOutcome>>,
}

/// Keeps the in-flight count right even when a job is aborted
struct InFlight(Arc<Shared>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct ReloadController {
    shared: Arc<Shared>,
    tasks: Mutex<JoinSet<()>>,
}

impl ReloadController {
    pub fn new(handle: Arc<ModelHandle>, trainer: Arc<dyn Trainer>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                handle,
                trainer,
                model_path: model_path.into(),
                in_flight: AtomicUsize::new(0),
                last_outcome: Mutex::new(None),
            }),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Start a retrain job in the background and return immediately.
    /// Must be called from within a Tokio runtime.
    pub fn trigger(&self) {
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(self.shared.clone());

        let mut tasks = self.tasks.lock();
        // Reap finished jobs so the set does not grow unbounded
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            let shared = guard.0.clone();
            let outcome = match reload(&shared).await {
                Ok(version) => {
                    tracing::info!("Model reloaded from {} (version {})", shared.model_path.display(), version);
                    ReloadOutcome {
                        succeeded: true,
                        message: "model reloaded".to_string(),
                        model_version: Some(version),
                        finished_at: Utc::now(),
                    }
                }
                Err(e) => {
                    tracing::error!("Retrain failed, keeping current model: {}", e);
                    ReloadOutcome {
                        succeeded: false,
                        message: e.to_string(),
                        model_version: None,
                        finished_at: Utc::now(),
                    }
                }
            };
            *shared.last_outcome.lock() = Some(outcome);
            drop(guard);
        });
    }

    pub fn status(&self) -> ReloadStatus {
        let in_flight = self.shared.in_flight.load(Ordering::Acquire);
        ReloadStatus {
            state: if in_flight > 0 { ReloadState::Training } else { ReloadState::Idle },
            in_flight,
            last_outcome: self.shared.last_outcome.lock().clone(),
        }
    }

    /// Abort running jobs (killing their training processes) and wait for them
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        if !tasks.is_empty() {
            tracing::info!("Aborting {} retrain job(s)", tasks.len());
        }
        tasks.shutdown().await;
    }
}

impl std::fmt::Debug for ReloadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadController")
            .field("trainer", &self.shared.trainer.describe())
            .field("model_path", &self.shared.model_path)
            .field("status", &self.status())
            .finish()
    }
}

async fn reload(shared: &Shared) -> Result<u64, ReloadError> {
    shared.trainer.train().await?;

    let path = shared.model_path.clone();
    let model = tokio::task::spawn_blocking(move || TrainedModel::load(&path))
        .await
        .map_err(|e| ReloadError::Task(e.to_string()))??;

    Ok(shared.handle.swap(Arc::new(model)))
}
