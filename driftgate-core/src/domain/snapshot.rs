// driftgate-core/src/domain/snapshot.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::stats::{Summary, l2_norm};

/// Names of the statistics carried by snapshots.
pub mod stat {
    pub const COUNT: &str = "count";
    pub const MEAN: &str = "mean";
    pub const STD: &str = "std";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
}

/// One timestamped observation of a metric.
///
/// `count == 0` means the source was reached and the target is empty.
/// It is never used to encode "could not collect": that is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub metric_key: String,
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

impl MetricSnapshot {
    pub fn new(metric_key: impl Into<String>, count: u64) -> Self {
        Self {
            metric_key: metric_key.into(),
            timestamp: Utc::now(),
            count,
            stats: BTreeMap::new(),
        }
    }

    /// Row-count observation of a mart: the only statistic is the count itself.
    pub fn row_count(metric_key: impl Into<String>, count: u64) -> Self {
        Self::new(metric_key, count).with_stat(stat::COUNT, count as f64)
    }

    /// Reduces embedding vectors to the distribution of their L2 norms.
    pub fn from_vectors(metric_key: impl Into<String>, vectors: &[Vec<f32>]) -> Self {
        let summary = Summary::of(vectors.iter().map(|v| l2_norm(v)));
        Self::new(metric_key, summary.count as u64)
            .with_stat(stat::MEAN, summary.mean)
            .with_stat(stat::STD, summary.std)
            .with_stat(stat::MIN, summary.min)
            .with_stat(stat::MAX, summary.max)
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_stat(mut self, name: &str, value: f64) -> Self {
        self.stats.insert(name.to_string(), value);
        self
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// One-line rendering used by the console report.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("count={}", self.count)];
        for (name, value) in &self.stats {
            if name != stat::COUNT {
                parts.push(format!("{}={:.4}", name, value));
            }
        }
        parts.join(" ")
    }
}
