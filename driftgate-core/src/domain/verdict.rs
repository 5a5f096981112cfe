// driftgate-core/src/domain/verdict.rs

use serde::Serialize;
use std::fmt;

/// Sign of a deviation from the historical mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Spike,
    Drop,
}

impl Direction {
    pub fn of(score: f64) -> Option<Self> {
        if score > 0.0 {
            Some(Direction::Spike)
        } else if score < 0.0 {
            Some(Direction::Drop)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Spike => write!(f, "spike"),
            Direction::Drop => write!(f, "drop"),
        }
    }
}

/// Numbers needed to reproduce a decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evidence {
    pub observed: Option<f64>,
    pub baseline_mean: Option<f64>,
    pub baseline_std: Option<f64>,
    pub score: Option<f64>,
    pub window: Option<usize>,
    pub direction: Option<Direction>,
}

/// Outcome of evaluating one metric key. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub metric_key: String,
    pub has_anomaly: bool,
    pub reason: String,
    pub evidence: Evidence,
}

impl Verdict {
    pub fn pass(metric_key: &str, reason: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            metric_key: metric_key.to_string(),
            has_anomaly: false,
            reason: reason.into(),
            evidence,
        }
    }

    pub fn fail(metric_key: &str, reason: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            metric_key: metric_key.to_string(),
            has_anomaly: true,
            reason: reason.into(),
            evidence,
        }
    }

    /// A metric that could not be collected fails with the error as its reason.
    pub fn from_error(metric_key: &str, error: &dyn fmt::Display) -> Self {
        Self::fail(
            metric_key,
            format!("collection failed: {}", error),
            Evidence::default(),
        )
    }

    /// The line handed to the notification sender.
    pub fn failure_line(&self) -> String {
        format!("{}: {}", self.metric_key, self.reason)
    }
}
