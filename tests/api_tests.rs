//! HTTP acceptance tests for the prediction API
//!
//! Tests:
//! 1. Banner and health endpoints
//! 2. /predict with the fallback model, strict and permissive schemas
//! 3. Malformed payloads, missing model, failing model
//! 4. /retrain returns immediately and swaps the model in the background
//! 5. /health reports degraded until some model is loaded

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use workforce_risk::{
    config::Config,
    create_router,
    service::{TrainError, Trainer},
    AppState,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// ONNX classifier answering 1 for Performance_Score 12 and 3 for 3
fn linear_classifier() -> Vec<u8> {
    std::fs::read(fixture("linear_classifier.onnx")).unwrap()
}

/// Writes a fixed artifact to the model path after a delay
struct StubTrainer {
    path: PathBuf,
    artifact: Vec<u8>,
    delay: Duration,
}

#[async_trait]
impl Trainer for StubTrainer {
    async fn train(&self) -> Result<(), TrainError> {
        tokio::time::sleep(self.delay).await;
        std::fs::write(&self.path, &self.artifact)?;
        Ok(())
    }

    fn describe(&self) -> String {
        "stub".into()
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    dir: tempfile::TempDir,
}

fn test_app(configure: impl FnOnce(&mut Config, &std::path::Path)) -> TestApp {
    test_app_with_trainer(configure, linear_classifier(), Duration::ZERO)
}

fn test_app_with_trainer(
    configure: impl FnOnce(&mut Config, &std::path::Path),
    artifact: Vec<u8>,
    delay: Duration,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config {
        model_path: dir.path().join("model.onnx"),
        prediction_log_path: dir.path().join("predictions.csv"),
        ..Config::default()
    };
    configure(&mut config, dir.path());

    let trainer = StubTrainer {
        path: config.model_path.clone(),
        artifact,
        delay,
    };
    let state = AppState::with_trainer(config, Arc::new(trainer));
    let app = create_router(state.clone());
    TestApp { app, state, dir }
}

fn full_record() -> Value {
    json!({
        "Claimed_Hours": 8.0,
        "Active_Hours": 7.5,
        "Claimed_Minus_Active": 0.5,
        "Utilization_Rate": 92.0,
        "Commits": 5,
        "PRs_Opened": 2,
        "Tasks_Done": 6,
        "Performance_Score": 12.0,
        "Meetings_Hours": 1.5,
        "Recent_HR_Flag": 0,
        "Project_Type": 0,
        "Role_Level": 1,
        "Team_ID": 2
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn predict(app: &Router, payload: &Value) -> (StatusCode, Value) {
    send(app, "POST", "/predict", Body::from(payload.to_string())).await
}

#[tokio::test]
async fn test_banner() {
    let t = test_app(|_, _| {});
    let (status, body) = send(&t.app, "GET", "/", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("running"));
    assert!(body["how_to_use"].as_str().unwrap().contains("/predict"));
}

#[tokio::test]
async fn test_health_reports_fallback() {
    let t = test_app(|_, _| {});
    let (status, body) = send(&t.app, "GET", "/health", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"]["loaded"], true);
    assert_eq!(body["model"]["kind"], "fallback");
    assert_eq!(body["reload"]["state"], "idle");
}

#[tokio::test]
async fn test_predict_high_performer_without_artifact() {
    let t = test_app(|_, _| {});
    let (status, body) = predict(&t.app, &full_record()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "predicted_productivity": 1,
            "confidence": 0.85,
            "risk_factors": [],
        })
    );
}

#[tokio::test]
async fn test_predict_low_performer_has_risk_factors() {
    let t = test_app(|_, _| {});
    let mut record = full_record();
    record["Performance_Score"] = json!(3);
    record["Utilization_Rate"] = json!(20);
    record["Claimed_Minus_Active"] = json!(6);
    record["Recent_HR_Flag"] = json!(1);

    let (status, body) = predict(&t.app, &record).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_productivity"], 3);
    assert_eq!(body["risk_factors"], json!(["performance", "utilization"]));
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let t = test_app(|_, _| {});
    let mut record = full_record();
    record["Performance_Score"] = json!(3);

    let (_, first) = predict(&t.app, &record).await;
    let (_, second) = predict(&t.app, &record).await;
    assert_eq!(first, second);
    assert_eq!(first["predicted_productivity"], 2);
}

#[tokio::test]
async fn test_strict_schema_lists_all_missing_fields() {
    let t = test_app(|_, _| {});
    let (status, body) = predict(&t.app, &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields");
    let missing = body["missing"].as_array().unwrap();
    assert_eq!(missing.len(), 13);
    assert_eq!(missing[0], "Claimed_Hours");
    assert_eq!(missing[12], "Team_ID");
}

#[tokio::test]
async fn test_permissive_schema_scores_partial_record() {
    let t = test_app(|config, _| config.strict_schema = false);
    let (status, body) = predict(&t.app, &json!({ "Performance_Score": 15, "Utilization_Rate": 100 })).await;

    // 0.4 + 0.3 + 0.2 + 0.1
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_productivity"], 1);
}

#[tokio::test]
async fn test_malformed_payloads() {
    let t = test_app(|_, _| {});

    let (status, body) = send(&t.app, "POST", "/predict", Body::from("{\"Commits\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed input");
    assert!(body.get("missing").is_none());

    let (status, _) = predict(&t.app, &json!([full_record()])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_unavailable_without_fallback() {
    let t = test_app(|config, _| config.fallback_enabled = false);

    let (status, body) = predict(&t.app, &full_record()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Model not loaded" }));

    let (_, health) = send(&t.app, "GET", "/health", Body::empty()).await;
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_retrain_recovers_degraded_service() {
    let t = test_app(|config, _| config.fallback_enabled = false);

    let (_, health) = send(&t.app, "GET", "/health", Body::empty()).await;
    assert_eq!(health["status"], "degraded");

    send(&t.app, "POST", "/retrain", Body::empty()).await;
    let deadline = Instant::now() + Duration::from_secs(5);
    while t.state.reload.status().in_flight > 0 {
        assert!(Instant::now() < deadline, "retrain never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let (status, health) = send(&t.app, "GET", "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model"]["kind"], "trained");

    let (status, body) = predict(&t.app, &full_record()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_productivity"], 1);
}

#[tokio::test]
async fn test_failing_trained_model_degrades_to_medium() {
    let t = test_app(|config, dir| {
        // Answers class 7 or above for every record
        let path = dir.join("broken.onnx");
        std::fs::copy(fixture("out_of_range_classifier.onnx"), &path).unwrap();
        config.model_path = path;
    });

    let (_, health) = send(&t.app, "GET", "/health", Body::empty()).await;
    assert_eq!(health["model"]["kind"], "trained");

    let (status, body) = predict(&t.app, &full_record()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_productivity"], 2);
    assert_eq!(body["risk_factors"], json!(["performance", "utilization"]));
}

#[tokio::test]
async fn test_predictions_are_logged() {
    let t = test_app(|_, _| {});
    predict(&t.app, &full_record()).await;
    predict(&t.app, &json!({})).await;

    let content = std::fs::read_to_string(t.dir.path().join("predictions.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("predicted_productivity"));
    assert!(lines[1].ends_with(",1"));
}

#[tokio::test]
async fn test_retrain_returns_immediately_and_swaps_model() {
    let t = test_app_with_trainer(
        |_, _| {},
        linear_classifier(),
        Duration::from_millis(300),
    );

    let started = Instant::now();
    let (status, body) = send(&t.app, "POST", "/retrain", Body::empty()).await;
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "retraining_started" }));

    // Still the fallback while training runs
    let (_, body) = predict(&t.app, &full_record()).await;
    assert_eq!(body["predicted_productivity"], 1);

    let deadline = Instant::now() + Duration::from_secs(5);
    while t.state.reload.status().in_flight > 0 {
        assert!(Instant::now() < deadline, "retrain never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let (_, health) = send(&t.app, "GET", "/health", Body::empty()).await;
    assert_eq!(health["model"]["kind"], "trained");
    assert_eq!(health["reload"]["last_outcome"]["succeeded"], true);

    // The fallback scores this record 2
    let mut record = full_record();
    record["Performance_Score"] = json!(3);
    let (_, body) = predict(&t.app, &record).await;
    assert_eq!(body["predicted_productivity"], 3);
}

#[tokio::test]
async fn test_failed_retrain_keeps_working_model() {
    let t = test_app_with_trainer(|_, _| {}, b"not an onnx graph".to_vec(), Duration::ZERO);

    send(&t.app, "POST", "/retrain", Body::empty()).await;
    let deadline = Instant::now() + Duration::from_secs(5);
    while t.state.reload.status().in_flight > 0 {
        assert!(Instant::now() < deadline, "retrain never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let (status, body) = predict(&t.app, &full_record()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_productivity"], 1);
    assert_eq!(t.state.service.handle().status().version, 1);
}

#[tokio::test]
async fn test_cors_preflight() {
    let t = test_app(|_, _| {});
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/predict")
                .header("origin", "http://localhost:3000")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
