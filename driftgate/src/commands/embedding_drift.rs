// driftgate/src/commands/embedding_drift.rs
//
// USE CASE: Embedding-norm drift gate.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracing::debug;
use driftgate_core::application::run_drift_gate;
use driftgate_core::domain::DomainError;
use driftgate_core::domain::config::{
    DEFAULT_COLLECTION, DEFAULT_DRIFT_BASELINE, DEFAULT_TIMEOUT_SECS, DriftGateConfig, GateOptions,
    default_drift_threshold,
};
use driftgate_core::infrastructure::adapters::ChromaStore;
use driftgate_core::infrastructure::settings::{DriftSettings, load_settings};

use super::{conclude, run_mode};
use crate::cli::DriftArgs;

pub async fn execute(config_file: Option<&Path>, args: DriftArgs) -> anyhow::Result<i32> {
    // A. Resolve the configuration (flags > env > settings file > defaults)
    let settings = load_settings(config_file, Path::new("."))
        .context("Failed to load gate settings")?
        .embedding_drift;
    let config = resolve(args, settings)?;
    debug!(?config, "Resolved gate configuration");

    println!(
        "🧭 Embedding drift gate: collection '{}' in {}",
        config.collection,
        config.persist_dir.display()
    );

    // B. Open the vector store (read-only)
    let timeout = Duration::from_secs(config.options.source_timeout_secs);
    let store = ChromaStore::open(&config.persist_dir, timeout)
        .await
        .with_context(|| format!("Failed to open vector store at {:?}", config.persist_dir))?;

    // C. Run the gate
    let outcome = run_drift_gate(&store, &config).await?;
    Ok(conclude(&outcome))
}

fn resolve(args: DriftArgs, settings: DriftSettings) -> Result<DriftGateConfig, DomainError> {
    let persist_dir = args.persist_dir.or(settings.persist_dir).ok_or_else(|| {
        DomainError::InvalidConfig("a vector store directory is required (--persist-dir)".into())
    })?;

    let mut options = GateOptions::new(
        args.baseline_file
            .or(settings.baseline_file)
            .unwrap_or_else(|| DEFAULT_DRIFT_BASELINE.into()),
    );
    options.failures_file = args.failures_file.or(settings.failures_file);
    options.mode = run_mode(args.update_baseline);
    options.source_timeout_secs = args
        .timeout_secs
        .or(settings.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    DriftGateConfig {
        persist_dir,
        collection: args
            .collection
            .or(settings.collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        threshold_pct: args
            .threshold
            .or(settings.threshold)
            .unwrap_or_else(default_drift_threshold),
        options,
    }
    .validated()
}
