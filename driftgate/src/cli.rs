// driftgate/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).
// Gate options are `Option`s: an absent flag falls back to the settings file,
// then to built-in defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "driftgate")]
#[command(about = "Data-quality gates for marts and embedding stores", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (default: ./driftgate.yaml when present)
    #[arg(long, global = true, env = "DRIFTGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🧭 Checks the embedding-norm distribution of a vector collection for drift
    EmbeddingDrift(DriftArgs),

    /// 📊 Checks mart row counts against their rolling history (Z-score)
    RowCount(RowCountArgs),

    /// 📝 Renders a failures file the way the notification sender does
    Failures {
        /// Failures file written by a gate
        file: PathBuf,

        /// Maximum number of bullets to display
        #[arg(long, default_value = "15")]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct DriftArgs {
    /// Vector store directory (contains chroma.sqlite3)
    #[arg(long, env = "DRIFTGATE_PERSIST_DIR")]
    pub persist_dir: Option<PathBuf>,

    /// Collection name (default: documents)
    #[arg(long, env = "DRIFTGATE_COLLECTION")]
    pub collection: Option<String>,

    /// Baseline file (default: metrics/baselines/embedding_norm.json)
    #[arg(long, env = "DRIFTGATE_DRIFT_BASELINE")]
    pub baseline_file: Option<PathBuf>,

    /// Allowed mean drift in percent (default: 10.0)
    #[arg(long, env = "DRIFTGATE_DRIFT_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Record the current state as the new baseline instead of checking
    #[arg(long)]
    pub update_baseline: bool,

    /// Where to write {"failures": [...]} when anomalies are found
    #[arg(long, env = "DRIFTGATE_FAILURES_FILE")]
    pub failures_file: Option<PathBuf>,

    /// Seconds before the vector store counts as unavailable (default: 30)
    #[arg(long, env = "DRIFTGATE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RowCountArgs {
    /// DuckDB warehouse file
    #[arg(long, env = "DRIFTGATE_DUCKDB")]
    pub duckdb: Option<PathBuf>,

    /// Marts to check (space or comma separated)
    #[arg(long, num_args = 1.., value_delimiter = ',', env = "DRIFTGATE_MARTS")]
    pub marts: Option<Vec<String>>,

    /// Warehouse schema holding the marts (default: main_marts)
    #[arg(long, env = "DRIFTGATE_SCHEMA")]
    pub schema: Option<String>,

    /// Baseline file (default: metrics/baselines/row_counts.json)
    #[arg(long, env = "DRIFTGATE_ROW_COUNT_BASELINE")]
    pub baseline_file: Option<PathBuf>,

    /// Absolute Z-score at which a count is anomalous (default: 3.0)
    #[arg(long, env = "DRIFTGATE_ZSCORE_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Number of most recent snapshots forming the window (default: 7)
    #[arg(long, env = "DRIFTGATE_WINDOW_SIZE")]
    pub window_size: Option<usize>,

    /// Keep at most N snapshots per mart when saving (default: keep all)
    #[arg(long, env = "DRIFTGATE_RETAIN")]
    pub retain: Option<usize>,

    /// Append the current counts to the history instead of checking
    #[arg(long)]
    pub update_baseline: bool,

    /// Where to write {"failures": [...]} when anomalies are found
    #[arg(long, env = "DRIFTGATE_FAILURES_FILE")]
    pub failures_file: Option<PathBuf>,

    /// Seconds before the warehouse counts as unavailable (default: 30)
    #[arg(long, env = "DRIFTGATE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}
