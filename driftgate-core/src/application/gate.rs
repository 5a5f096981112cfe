// driftgate-core/src/application/gate.rs

use chrono::Utc;
use futures::StreamExt;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::application::collector::{MetricCollector, RowCountCollector, VectorNormCollector};
use crate::domain::baseline::{BaselineDocument, NormBaseline, SnapshotHistory};
use crate::domain::config::{DriftGateConfig, GateOptions, RowCountGateConfig, RunMode};
use crate::domain::detection::{DetectionPolicy, Detector};
use crate::domain::report::FailureReport;
use crate::domain::snapshot::MetricSnapshot;
use crate::domain::verdict::Verdict;
use crate::error::GateError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::report_file::write_failure_report;
use crate::infrastructure::store::JsonBaselineStore;
use crate::ports::vector_store::VectorStore;
use crate::ports::warehouse::WarehouseConnector;

/// `COLLECTING -> DETECTING -> {UPDATING | REPORTING} -> DONE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Collecting,
    Detecting,
    Updating,
    Reporting,
    Done,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateState::Collecting => "COLLECTING",
            GateState::Detecting => "DETECTING",
            GateState::Updating => "UPDATING",
            GateState::Reporting => "REPORTING",
            GateState::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub mode: RunMode,
    pub snapshots: Vec<MetricSnapshot>,
    /// Empty in update mode: updating never judges.
    pub verdicts: Vec<Verdict>,
    pub report: FailureReport,
    pub baseline_updated: bool,
}

impl GateOutcome {
    pub fn passed(&self) -> bool {
        self.report.is_empty()
    }

    /// 0 = pass or baseline updated, 1 = anomaly detected.
    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }
}

type Collected = Vec<(String, Result<MetricSnapshot, GateError>)>;

/// Runs one gate invocation. Owns the baseline file for its duration: it is
/// read once after collection and written at most once, in update mode.
pub struct GateRunner<'a, D> {
    collector: &'a dyn MetricCollector,
    policy: DetectionPolicy,
    metric_keys: Vec<String>,
    options: GateOptions,
    retain: Option<usize>,
    store: JsonBaselineStore,
    _document: PhantomData<fn() -> D>,
}

impl<'a, D: BaselineDocument> GateRunner<'a, D> {
    pub fn new(
        collector: &'a dyn MetricCollector,
        policy: DetectionPolicy,
        metric_keys: Vec<String>,
        options: GateOptions,
    ) -> Self {
        let store = JsonBaselineStore::new(options.baseline_file.clone());
        Self {
            collector,
            policy,
            metric_keys,
            options,
            retain: None,
            store,
            _document: PhantomData,
        }
    }

    pub fn with_retention(mut self, retain: Option<usize>) -> Self {
        self.retain = retain;
        self
    }

    #[instrument(skip(self), fields(policy = self.policy.name(), source = self.collector.source_name()))]
    pub async fn run(&self) -> Result<GateOutcome, GateError> {
        self.enter(GateState::Collecting);
        let collected = self.collect_all().await?;

        let document: Option<D> = self.store.load()?;
        self.print_baselines(document.as_ref());

        let outcome = match self.options.mode {
            RunMode::UpdateBaseline => self.update(document, collected)?,
            RunMode::Check => self.check(document.as_ref(), collected),
        };

        self.enter(GateState::Done);
        Ok(outcome)
    }

    fn enter(&self, state: GateState) {
        debug!(%state, "Gate state transition");
    }

    /// Collects every key concurrently, keeping configuration order.
    /// Source-level failures abort; per-key failures are kept for detection.
    async fn collect_all(&self) -> Result<Collected, GateError> {
        let timeout = Duration::from_secs(self.options.source_timeout_secs);
        let collector = self.collector;

        let tasks = self.metric_keys.iter().map(move |key| async move {
            let result = match tokio::time::timeout(timeout, collector.collect(key)).await {
                Ok(result) => result,
                Err(_) => Err(InfrastructureError::SourceUnavailable {
                    source_name: collector.source_name().to_string(),
                    reason: format!("no answer within {}s", timeout.as_secs()),
                }
                .into()),
            };
            (key.clone(), result)
        });

        let results: Collected = futures::stream::iter(tasks)
            .buffered(self.metric_keys.len().max(1))
            .collect()
            .await;

        let mut collected = Vec::with_capacity(results.len());
        for (key, result) in results {
            match result {
                Ok(snapshot) => {
                    println!("📊 Current [{}]: {}", key, snapshot.describe());
                    collected.push((key, Ok(snapshot)));
                }
                Err(e) if e.is_fatal() => {
                    error!(metric = %key, error = %e, "Source failure, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(metric = %key, error = %e, "Collection failed");
                    println!("⚠️  [{}] collection failed: {}", key, e);
                    collected.push((key, Err(e)));
                }
            }
        }
        Ok(collected)
    }

    fn print_baselines(&self, document: Option<&D>) {
        for key in &self.metric_keys {
            match document.and_then(|d| d.baseline_for(key)) {
                Some(baseline) => println!(
                    "📈 Baseline [{}] (from {}): {}",
                    key,
                    self.store.path().display(),
                    baseline
                ),
                None => println!("📈 Baseline [{}]: none", key),
            }
        }
    }

    fn update(&self, document: Option<D>, collected: Collected) -> Result<GateOutcome, GateError> {
        self.enter(GateState::Updating);

        // Ground truth is all-or-nothing: a key that could not be collected
        // must not leave a partial baseline behind.
        let snapshots = collected
            .into_iter()
            .map(|(_, result)| result)
            .collect::<Result<Vec<_>, _>>()?;

        let mut baseline_updated = false;
        if let Some(updated) = D::record(document, &snapshots, Utc::now(), self.retain) {
            self.store.save(&updated)?;
            baseline_updated = true;
            info!(count = snapshots.len(), "Baseline updated");
            println!(
                "✅ Saved {} snapshot(s) to {}",
                snapshots.len(),
                self.store.path().display()
            );
        }

        Ok(GateOutcome {
            mode: RunMode::UpdateBaseline,
            snapshots,
            verdicts: Vec::new(),
            report: FailureReport::default(),
            baseline_updated,
        })
    }

    fn check(&self, document: Option<&D>, collected: Collected) -> GateOutcome {
        self.enter(GateState::Detecting);

        let mut snapshots = Vec::with_capacity(collected.len());
        let mut verdicts = Vec::with_capacity(collected.len());
        for (key, result) in collected {
            let verdict = match result {
                Ok(snapshot) => {
                    let baseline = document.and_then(|d| d.baseline_for(&key));
                    let verdict = self.policy.evaluate(&snapshot, baseline.as_ref());
                    snapshots.push(snapshot);
                    verdict
                }
                Err(e) => Verdict::from_error(&key, &e),
            };

            let icon = if verdict.has_anomaly { "🚨" } else { "✅" };
            println!("   {} {}: {}", icon, key, verdict.reason);
            verdicts.push(verdict);
        }

        self.enter(GateState::Reporting);
        let report = FailureReport::from_verdicts(&verdicts);

        if report.is_empty() {
            println!("✅ No anomalies detected");
        } else {
            println!("🚨 ANOMALIES DETECTED:");
            for failure in &report.failures {
                println!("   • {}", failure);
            }
            self.write_report(&report);
        }

        GateOutcome {
            mode: RunMode::Check,
            snapshots,
            verdicts,
            report,
            baseline_updated: false,
        }
    }

    // The verdict does not depend on this file: a write failure is reported, not fatal.
    fn write_report(&self, report: &FailureReport) {
        let Some(path) = &self.options.failures_file else {
            return;
        };
        match write_failure_report(path, report) {
            Ok(()) => println!("📝 Wrote failure details to {}", path.display()),
            Err(e) => {
                error!(path = ?path, error = %e, "Could not write failures file");
                eprintln!("⚠️  Could not write failures file {}: {}", path.display(), e);
            }
        }
    }
}

// --- USE CASES ---

/// Embedding-norm drift gate over one collection.
pub async fn run_drift_gate(
    store: &dyn VectorStore,
    config: &DriftGateConfig,
) -> Result<GateOutcome, GateError> {
    let collector = VectorNormCollector::new(store);
    GateRunner::<NormBaseline>::new(
        &collector,
        config.policy(),
        vec![config.collection.clone()],
        config.options.clone(),
    )
    .run()
    .await
}

/// Z-score gate over the row counts of every configured mart.
pub async fn run_row_count_gate(
    warehouse: &dyn WarehouseConnector,
    config: &RowCountGateConfig,
) -> Result<GateOutcome, GateError> {
    let collector = RowCountCollector::new(warehouse, config.schema.clone());
    GateRunner::<SnapshotHistory>::new(
        &collector,
        config.policy(),
        config.marts.clone(),
        config.options.clone(),
    )
    .with_retention(config.retain)
    .run()
    .await
}
