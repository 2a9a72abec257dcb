//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::service::PredictionError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Caller input errors
    ValidationError {
        message: String,
        missing: Option<Vec<String>>,
    },

    // No model to answer with
    ModelUnavailable,

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError { message, missing: Some(missing) } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "missing": missing }),
            ),
            AppError::ValidationError { message, missing: None } => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::ModelUnavailable => {
                tracing::error!("Prediction requested but no model is loaded");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Model not loaded" }))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Validation { message, missing } => {
                AppError::ValidationError { message, missing }
            }
            PredictionError::ModelUnavailable => AppError::ModelUnavailable,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
