//! Rule-based scoring engine
//!
//! Weighted linear combination of four normalized sub-scores. This is the
//! reference semantics a trained model is judged against, and the fallback
//! used when no trained artifact is available.

use crate::models::{MetricsRecord, RiskLevel, RiskScore};

// ============================================================================
// WEIGHTS & THRESHOLDS
// ============================================================================

pub const PERFORMANCE_WEIGHT: f64 = 0.4;
pub const UTILIZATION_WEIGHT: f64 = 0.3;
pub const TIME_ACCURACY_WEIGHT: f64 = 0.2;
pub const HR_STATUS_WEIGHT: f64 = 0.1;

/// Performance_Score scale ceiling
pub const PERFORMANCE_SCALE: f64 = 15.0;
/// Utilization_Rate is a percentage
pub const UTILIZATION_SCALE: f64 = 100.0;
/// Claimed_Minus_Active hours at which time accuracy bottoms out
pub const OVERCLAIM_SCALE: f64 = 8.0;

/// score >= LOW_RISK_THRESHOLD => level 1
pub const LOW_RISK_THRESHOLD: f64 = 0.7;
/// score >= MEDIUM_RISK_THRESHOLD => level 2, below => level 3
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Weighted sub-scores, each already multiplied by its weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub performance: f64,
    pub utilization: f64,
    pub time_accuracy: f64,
    pub hr_status: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> RiskScore {
        RiskScore::new(self.performance + self.utilization + self.time_accuracy + self.hr_status)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score a record. Total: missing or invalid fields read as 0.
    pub fn score(&self, record: &MetricsRecord) -> (RiskScore, RiskLevel) {
        let score = self.breakdown(record).total();
        (score, level_for(score))
    }

    pub fn breakdown(&self, record: &MetricsRecord) -> ScoreBreakdown {
        let performance = unit(record.number("Performance_Score") / PERFORMANCE_SCALE);
        let utilization = unit(record.number("Utilization_Rate") / UTILIZATION_SCALE);
        let overclaim = unit(record.number("Claimed_Minus_Active") / OVERCLAIM_SCALE);
        let clean_hr = if record.number("Recent_HR_Flag") <= 0.0 { 1.0 } else { 0.0 };

        ScoreBreakdown {
            performance: performance * PERFORMANCE_WEIGHT,
            utilization: utilization * UTILIZATION_WEIGHT,
            time_accuracy: (1.0 - overclaim) * TIME_ACCURACY_WEIGHT,
            hr_status: clean_hr * HR_STATUS_WEIGHT,
        }
    }
}

/// Map a score onto a risk level, lower bounds inclusive
pub fn level_for(score: RiskScore) -> RiskLevel {
    let s = score.value();
    if s >= LOW_RISK_THRESHOLD {
        RiskLevel::Low
    } else if s >= MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
