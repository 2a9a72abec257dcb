//! Workforce Risk - employee productivity risk scoring service
//!
//! Scores employee-period metrics into a risk level (1 = low, 3 = high)
//! using a trained classifier when one is available and a rule-based
//! scoring engine otherwise.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       WORKFORCE RISK                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────────────┐   ┌────────────────┐  │
//! │  │  API      │──▶│ PredictionService │──▶│  ModelHandle   │  │
//! │  │  (Axum)   │   │ (validate/degrade)│   │ (atomic swap)  │  │
//! │  └─────┬─────┘   └─────────┬─────────┘   └───────▲────────┘  │
//! │        │                   ▼                     │           │
//! │        │           ┌───────────────┐   ┌─────────┴────────┐  │
//! │        └──────────▶│ PredictionLog │   │ ReloadController │  │
//! │          /retrain  │    (CSV)      │   │ (background job) │  │
//! │                    └───────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod models;
pub mod prediction_log;
pub mod service;

use std::sync::Arc;

use axum::{
    Router,
    http::{header, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use config::Config;
use model::{ModelHandle, Predictor, RuleBasedFallback, TrainedModel};
use prediction_log::PredictionLog;
use service::{CommandTrainer, PredictionService, ReloadController, TrainError, Trainer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub reload: Arc<ReloadController>,
    pub config: Config,
}

impl AppState {
    /// Wire up the service from configuration, loading the startup model
    pub fn from_config(config: Config) -> Result<Self, TrainError> {
        let trainer = CommandTrainer::from_command_line(&config.train_command)?
            .with_workdir(config.train_workdir.clone())
            .with_model_path(&config.model_path)?;
        Ok(Self::with_trainer(config, Arc::new(trainer)))
    }

    pub fn with_trainer(config: Config, trainer: Arc<dyn Trainer>) -> Self {
        let handle = Arc::new(load_startup_model(&config));

        let mut service = PredictionService::new(handle.clone(), config.strict_schema);
        if config.prediction_log_enabled {
            service = service.with_log(PredictionLog::new(&config.prediction_log_path));
        }

        let reload = ReloadController::new(handle, trainer, config.model_path.clone());

        Self {
            service: Arc::new(service),
            reload: Arc::new(reload),
            config,
        }
    }
}

/// Trained artifact if it loads, else the rule-based fallback (when allowed)
pub fn load_startup_model(config: &Config) -> ModelHandle {
    match TrainedModel::load(&config.model_path) {
        Ok(model) => ModelHandle::new(Arc::new(model)),
        Err(e) if config.fallback_enabled => {
            tracing::warn!("{}; serving rule-based fallback", e);
            let fallback: Arc<dyn Predictor> = Arc::new(RuleBasedFallback::new());
            ModelHandle::new(fallback)
        }
        Err(e) => {
            tracing::error!("{}; fallback disabled, predictions unavailable until retrain", e);
            ModelHandle::empty()
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/retrain", post(handlers::retrain::trigger))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        )
        .with_state(state)
}
