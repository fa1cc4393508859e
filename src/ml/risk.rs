use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Default early-warning threshold. Applied to scores recorded out of 500.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Normal,
    AtRisk,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Normal => f.write_str("Normal"),
            RiskLevel::AtRisk => f.write_str("At risk"),
        }
    }
}

/// Notification intent raised for an at-risk prediction
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyWarning {
    pub predicted_score: f64,
    pub threshold: f64,
}

/// Receiver of early warnings; delivery to parents and teachers lives
/// outside this crate.
pub trait NotificationSink {
    fn notify(&self, warning: &EarlyWarning);
}

/// Records early warnings in the log
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, warning: &EarlyWarning) {
        warn!(
            predicted_score = warning.predicted_score,
            threshold = warning.threshold,
            "Student at risk of underperforming; notifying parents and teachers"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskClassifier {
    threshold: f64,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl RiskClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly below the threshold is at risk.
    pub fn classify(&self, predicted_score: f64) -> RiskLevel {
        if predicted_score < self.threshold {
            RiskLevel::AtRisk
        } else {
            RiskLevel::Normal
        }
    }

    /// Classify and raise an early warning when at risk.
    pub fn assess(&self, predicted_score: f64, sink: &dyn NotificationSink) -> RiskLevel {
        let level = self.classify(predicted_score);
        if level == RiskLevel::AtRisk {
            sink.notify(&EarlyWarning {
                predicted_score,
                threshold: self.threshold,
            });
        }
        level
    }
}
