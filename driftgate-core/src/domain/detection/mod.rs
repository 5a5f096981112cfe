// driftgate-core/src/domain/detection/mod.rs

pub mod drift;
pub mod zscore;

pub use drift::DriftPolicy;
pub use zscore::ZScorePolicy;

use crate::domain::baseline::Baseline;
use crate::domain::snapshot::MetricSnapshot;
use crate::domain::verdict::Verdict;

/// Judges one current snapshot against its history.
///
/// Pure: evaluating never mutates the baseline, and the same inputs always
/// produce the same verdict.
pub trait Detector: Send + Sync {
    fn evaluate(&self, current: &MetricSnapshot, baseline: Option<&Baseline>) -> Verdict;
}

/// Policy selected for a gate. New policies are added here, not in the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionPolicy {
    Drift(DriftPolicy),
    ZScore(ZScorePolicy),
}

impl DetectionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            DetectionPolicy::Drift(_) => "drift",
            DetectionPolicy::ZScore(_) => "zscore",
        }
    }
}

impl Detector for DetectionPolicy {
    fn evaluate(&self, current: &MetricSnapshot, baseline: Option<&Baseline>) -> Verdict {
        match self {
            DetectionPolicy::Drift(policy) => policy.evaluate(current, baseline),
            DetectionPolicy::ZScore(policy) => policy.evaluate(current, baseline),
        }
    }
}
