//! Configuration module

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Trained ONNX model; label encoders sit next to it
    pub model_path: PathBuf,

    /// Append-only CSV of predictions
    pub prediction_log_path: PathBuf,

    pub prediction_log_enabled: bool,

    /// Require every expected field in /predict payloads
    pub strict_schema: bool,

    /// Serve the rule-based model when no artifact loads
    pub fallback_enabled: bool,

    /// External training command, whitespace separated.
    /// Runs with `MODEL_PATH` set to the absolute model path.
    pub train_command: String,

    pub train_workdir: Option<PathBuf>,

    /// Emit JSON log lines instead of the pretty formatter
    pub json_logs: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from("employee_productivity_model.onnx"),
            prediction_log_path: PathBuf::from("predictions_log.csv"),
            prediction_log_enabled: true,
            strict_schema: true,
            fallback_enabled: true,
            train_command: "python training/train_model.py".to_string(),
            train_workdir: None,
            json_logs: false,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            prediction_log_path: lookup("PREDICTION_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prediction_log_path),

            prediction_log_enabled: lookup("PREDICTION_LOG_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.prediction_log_enabled),

            strict_schema: lookup("STRICT_SCHEMA")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.strict_schema),

            fallback_enabled: lookup("FALLBACK_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.fallback_enabled),

            train_command: lookup("TRAIN_COMMAND")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(defaults.train_command),

            train_workdir: lookup("TRAIN_WORKDIR").map(PathBuf::from),

            json_logs: lookup("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logs),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Socket address to bind, falling back to localhost on a bad host
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], self.port)))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
