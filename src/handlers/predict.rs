//! Prediction handler

use axum::{body::Bytes, extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::PredictionResponse;

/// Score one metrics record.
///
/// The body is read as raw bytes so malformed JSON and non-object payloads
/// get the same 400 regardless of the request's content type.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictionResponse>> {
    let service = state.service.clone();

    // Model evaluation and the log append are blocking work
    let response = tokio::task::spawn_blocking(move || service.predict_bytes(&body)).await??;

    tracing::debug!("Predicted level {}", response.predicted_productivity);
    Ok(Json(response))
}
