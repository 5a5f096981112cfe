// driftgate/src/commands/row_count.rs
//
// USE CASE: Mart row-count Z-score gate.

use std::path::Path;

use anyhow::Context;
use tracing::debug;
use driftgate_core::application::run_row_count_gate;
use driftgate_core::domain::DomainError;
use driftgate_core::domain::config::{
    DEFAULT_MART_SCHEMA, DEFAULT_ROW_COUNT_BASELINE, DEFAULT_TIMEOUT_SECS, GateOptions,
    RowCountGateConfig, default_window_size, default_zscore_threshold,
};
use driftgate_core::infrastructure::adapters::DuckDBWarehouse;
use driftgate_core::infrastructure::settings::{RowCountSettings, load_settings};

use super::{conclude, run_mode};
use crate::cli::RowCountArgs;

pub async fn execute(config_file: Option<&Path>, args: RowCountArgs) -> anyhow::Result<i32> {
    // A. Resolve the configuration (flags > env > settings file > defaults)
    let settings = load_settings(config_file, Path::new("."))
        .context("Failed to load gate settings")?
        .row_count;
    let config = resolve(args, settings)?;
    debug!(?config, "Resolved gate configuration");

    println!(
        "📊 Row-count gate: {} mart(s) in {}.{}",
        config.marts.len(),
        config.duckdb.display(),
        config.schema
    );

    // B. Open the warehouse (read-only)
    let warehouse = DuckDBWarehouse::open(&config.duckdb)
        .with_context(|| format!("Failed to open warehouse at {:?}", config.duckdb))?;

    // C. Run the gate
    let outcome = run_row_count_gate(&warehouse, &config).await?;
    Ok(conclude(&outcome))
}

fn resolve(args: RowCountArgs, settings: RowCountSettings) -> Result<RowCountGateConfig, DomainError> {
    let duckdb = args.duckdb.or(settings.duckdb).ok_or_else(|| {
        DomainError::InvalidConfig("a warehouse file is required (--duckdb)".into())
    })?;

    let mut options = GateOptions::new(
        args.baseline_file
            .or(settings.baseline_file)
            .unwrap_or_else(|| DEFAULT_ROW_COUNT_BASELINE.into()),
    );
    options.failures_file = args.failures_file.or(settings.failures_file);
    options.mode = run_mode(args.update_baseline);
    options.source_timeout_secs = args
        .timeout_secs
        .or(settings.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    RowCountGateConfig {
        duckdb,
        marts: args.marts.or(settings.marts).unwrap_or_default(),
        schema: args
            .schema
            .or(settings.schema)
            .unwrap_or_else(|| DEFAULT_MART_SCHEMA.to_string()),
        threshold: args
            .threshold
            .or(settings.threshold)
            .unwrap_or_else(default_zscore_threshold),
        window_size: args
            .window_size
            .or(settings.window_size)
            .unwrap_or_else(default_window_size),
        retain: args.retain.or(settings.retain),
        options,
    }
    .validated()
}
