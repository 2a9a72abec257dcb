//! Service banner

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Banner {
    message: &'static str,
    how_to_use: &'static str,
}

pub async fn index() -> Json<Banner> {
    Json(Banner {
        message: "Employee Productivity Prediction API is running successfully.",
        how_to_use: "POST /predict with employee metrics as JSON. POST /retrain to retrain in the background.",
    })
}
