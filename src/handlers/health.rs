//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use crate::model::ModelStatus;
use crate::service::ReloadStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelStatus,
    reload: ReloadStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.service.handle().status();

    Json(HealthResponse {
        status: if model.loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model,
        reload: state.reload.status(),
    })
}
