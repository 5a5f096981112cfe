// driftgate-core/src/domain/detection/zscore.rs

use std::slice;

use crate::domain::baseline::Baseline;
use crate::domain::detection::Detector;
use crate::domain::snapshot::MetricSnapshot;
use crate::domain::stats::Summary;
use crate::domain::verdict::{Direction, Evidence, Verdict};

pub const DEFAULT_THRESHOLD: f64 = 3.0;
pub const DEFAULT_WINDOW_SIZE: usize = 7;

/// Rolling-window Z-score on the observation count.
#[derive(Debug, Clone, PartialEq)]
pub struct ZScorePolicy {
    /// `|z| >= threshold` is anomalous (inclusive).
    pub threshold: f64,
    /// Number of most recent snapshots used as history.
    pub window_size: usize,
}

impl Default for ZScorePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ZScorePolicy {
    pub fn new(threshold: f64, window_size: usize) -> Self {
        Self {
            threshold,
            window_size,
        }
    }

    /// `std == 0` yields 0: a constant history cannot be deviated from.
    pub fn zscore(current: f64, history: &Summary) -> f64 {
        if history.std == 0.0 {
            return 0.0;
        }
        (current - history.mean) / history.std
    }
}

impl Detector for ZScorePolicy {
    fn evaluate(&self, current: &MetricSnapshot, baseline: Option<&Baseline>) -> Verdict {
        let key = current.metric_key.as_str();
        let observed = current.count as f64;

        let history: &[MetricSnapshot] = match baseline {
            None => &[],
            Some(Baseline::Window(snapshots)) => snapshots,
            Some(Baseline::Reference(snapshot)) => slice::from_ref(snapshot),
        };
        let window = &history[history.len().saturating_sub(self.window_size)..];

        if window.len() < 2 {
            return Verdict::pass(
                key,
                format!("insufficient history ({} snapshots)", window.len()),
                Evidence {
                    observed: Some(observed),
                    window: Some(window.len()),
                    ..Default::default()
                },
            );
        }

        let summary = Summary::of(window.iter().map(|s| s.count as f64));
        let z = Self::zscore(observed, &summary);
        let direction = Direction::of(z);
        let evidence = Evidence {
            observed: Some(observed),
            baseline_mean: Some(summary.mean),
            baseline_std: Some(summary.std),
            score: Some(z),
            window: Some(window.len()),
            direction,
        };
        let details = format!(
            "(Z={:.2}, current={}, mean={:.1}, window={})",
            z,
            current.count,
            summary.mean,
            window.len()
        );

        if z.abs() >= self.threshold {
            let label = direction.map_or_else(|| "deviation".to_string(), |d| d.to_string());
            Verdict::fail(key, format!("{} detected {}", label, details), evidence)
        } else {
            Verdict::pass(key, format!("within threshold {}", details), evidence)
        }
    }
}
