// driftgate-core/src/domain/detection/drift.rs

use crate::domain::baseline::Baseline;
use crate::domain::detection::Detector;
use crate::domain::snapshot::{MetricSnapshot, stat};
use crate::domain::verdict::{Evidence, Verdict};

pub const DEFAULT_THRESHOLD_PCT: f64 = 10.0;

/// Relative change of the mean against a single reference snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftPolicy {
    /// Tolerated drift, in percent of the reference mean.
    pub threshold_pct: f64,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

impl DriftPolicy {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }
}

impl Detector for DriftPolicy {
    fn evaluate(&self, current: &MetricSnapshot, baseline: Option<&Baseline>) -> Verdict {
        let key = current.metric_key.as_str();
        let observed = current.stat(stat::MEAN).unwrap_or(0.0);

        // 1. Cold start: never fails
        let reference = match baseline {
            Some(Baseline::Reference(snapshot)) => snapshot,
            Some(Baseline::Window(snapshots)) if !snapshots.is_empty() => {
                &snapshots[snapshots.len() - 1]
            }
            _ => {
                return Verdict::pass(
                    key,
                    "no baseline (first run)",
                    Evidence {
                        observed: Some(observed),
                        ..Default::default()
                    },
                );
            }
        };

        let baseline_mean = reference.stat(stat::MEAN).unwrap_or(0.0);
        let evidence = Evidence {
            observed: Some(observed),
            baseline_mean: Some(baseline_mean),
            baseline_std: reference.stat(stat::STD),
            ..Default::default()
        };

        // 2. Empty output after a known baseline is pipeline breakage, not drift
        if current.is_empty() {
            return Verdict::fail(key, "no observations in current snapshot", evidence);
        }

        // 3. A zero reference mean is read as "uninitialized".
        // This also swallows a legitimately-zero history; kept for compatibility.
        if reference.is_empty() || baseline_mean == 0.0 {
            return Verdict::pass(key, "baseline uninitialized (reference mean is 0)", evidence);
        }

        // 4. Relative drift
        let drift_pct = (observed - baseline_mean).abs() / baseline_mean.abs() * 100.0;
        let evidence = Evidence {
            score: Some(drift_pct),
            ..evidence
        };

        if drift_pct > self.threshold_pct {
            Verdict::fail(
                key,
                format!(
                    "mean drift {:.2}% exceeds threshold {}% (current={:.4}, baseline={:.4})",
                    drift_pct, self.threshold_pct, observed, baseline_mean
                ),
                evidence,
            )
        } else {
            Verdict::pass(
                key,
                format!(
                    "mean drift {:.2}% within threshold {}%",
                    drift_pct, self.threshold_pct
                ),
                evidence,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_mean(count: u64, mean: f64) -> MetricSnapshot {
        MetricSnapshot::new("documents", count).with_stat(stat::MEAN, mean)
    }

    fn reference(count: u64, mean: f64) -> Baseline {
        Baseline::Reference(with_mean(count, mean))
    }

    #[test]
    fn test_first_run_never_fails() {
        let policy = DriftPolicy::default();
        for current in [with_mean(0, 0.0), with_mean(10, 1e9)] {
            let verdict = policy.evaluate(&current, None);
            assert!(!verdict.has_anomaly);
            assert_eq!(verdict.reason, "no baseline (first run)");
        }
    }

    #[test]
    fn test_drift_above_threshold() {
        let verdict = DriftPolicy::new(10.0).evaluate(&with_mean(50, 112.0), Some(&reference(50, 100.0)));
        assert!(verdict.has_anomaly);
        assert!((verdict.evidence.score.unwrap_or_default() - 12.0).abs() < 1e-9);
        assert!(verdict.reason.contains("12.00%"));
        assert!(verdict.reason.contains("threshold 10%"));
    }

    #[test]
    fn test_drift_within_threshold() {
        let verdict = DriftPolicy::new(10.0).evaluate(&with_mean(50, 105.0), Some(&reference(50, 100.0)));
        assert!(!verdict.has_anomaly);
        assert!((verdict.evidence.score.unwrap_or_default() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_drift_exactly_at_threshold_passes() {
        let verdict = DriftPolicy::new(10.0).evaluate(&with_mean(50, 90.0), Some(&reference(50, 100.0)));
        assert!(!verdict.has_anomaly);
    }

    #[test]
    fn test_empty_current_always_fails_against_baseline() {
        for threshold in [0.1, 10.0, 1e6] {
            let verdict = DriftPolicy::new(threshold).evaluate(&with_mean(0, 0.0), Some(&reference(50, 1.0)));
            assert!(verdict.has_anomaly);
            assert_eq!(verdict.reason, "no observations in current snapshot");
        }
    }

    #[test]
    fn test_zero_reference_mean_is_uninitialized() {
        let verdict = DriftPolicy::default().evaluate(&with_mean(50, 3.0), Some(&reference(0, 0.0)));
        assert!(!verdict.has_anomaly);
        assert!(verdict.reason.contains("uninitialized"));
    }

    #[test]
    fn test_window_baseline_uses_latest_snapshot() {
        let window = Baseline::Window(vec![with_mean(5, 1.0), with_mean(5, 100.0)]);
        let verdict = DriftPolicy::new(10.0).evaluate(&with_mean(5, 101.0), Some(&window));
        assert!(!verdict.has_anomaly);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let policy = DriftPolicy::default();
        let current = with_mean(50, 130.0);
        let baseline = reference(50, 100.0);
        assert_eq!(
            policy.evaluate(&current, Some(&baseline)),
            policy.evaluate(&current, Some(&baseline))
        );
    }
}
