//! Retrain trigger handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    status: &'static str,
}

/// Kick off a background retrain; never waits for the result
pub async fn trigger(State(state): State<AppState>) -> Json<RetrainResponse> {
    state.reload.trigger();
    tracing::info!("Retraining started");

    Json(RetrainResponse {
        status: "retraining_started",
    })
}
