//! Prediction output models

use serde::Serialize;

/// Confidence reported for every prediction until a model exposes posteriors
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Factors reported for any level above low risk
pub const RISK_FACTORS: [&str; 2] = ["performance", "utilization"];

/// Discretized productivity risk (1 = low risk, 3 = high risk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum RiskLevel {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl RiskLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<RiskLevel> for u8 {
    fn from(level: RiskLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<i64> for RiskLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RiskLevel::Low),
            2 => Ok(RiskLevel::Medium),
            3 => Ok(RiskLevel::High),
            other => Err(format!("risk level out of range: {}", other)),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Weighted risk score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RiskScore(f64);

impl RiskScore {
    pub fn new(value: f64) -> Self {
        Self(if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 })
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Body returned by `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_productivity: RiskLevel,
    pub confidence: f64,
    pub risk_factors: Vec<String>,
}

impl PredictionResponse {
    pub fn from_level(level: RiskLevel) -> Self {
        let risk_factors = if level > RiskLevel::Low {
            RISK_FACTORS.iter().map(|f| f.to_string()).collect()
        } else {
            Vec::new()
        };

        Self {
            predicted_productivity: level,
            confidence: DEFAULT_CONFIDENCE,
            risk_factors,
        }
    }
}
