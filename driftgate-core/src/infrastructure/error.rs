// driftgate-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(driftgate::infra::database::duckdb),
        help("An error occurred inside the warehouse SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("SQLite Error: {0}")]
    #[diagnostic(
        code(driftgate::infra::database::sqlite),
        help("An error occurred while reading the vector store database.")
    )]
    Sqlite(#[from] sqlx::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- SOURCES ---
    #[error("Source '{source_name}' is unavailable: {reason}")]
    #[diagnostic(
        code(driftgate::infra::source_unavailable),
        help("The warehouse or vector store could not be opened. Check the path and that no writer holds an exclusive lock.")
    )]
    SourceUnavailable { source_name: String, reason: String },

    #[error("'{target}' not found in source '{source_name}'")]
    #[diagnostic(code(driftgate::infra::target_not_found))]
    TargetNotFound { target: String, source_name: String },

    // --- BASELINE STORAGE ---
    #[error("Baseline file {path:?} is corrupt: {reason}")]
    #[diagnostic(
        code(driftgate::infra::storage_corrupt),
        help("Fix or remove the file explicitly. A corrupt baseline is never treated as a first run.")
    )]
    StorageCorrupt { path: PathBuf, reason: String },

    #[error("Failed to write {path:?}: {source}")]
    #[diagnostic(
        code(driftgate::infra::storage_write),
        help("Check disk space and permissions on the baseline directory.")
    )]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(driftgate::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(driftgate::infra::json))]
    Json(#[from] serde_json::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(driftgate::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Settings file not found at '{0}'")]
    #[diagnostic(code(driftgate::infra::config_missing))]
    ConfigNotFound(String),
}

impl InfrastructureError {
    /// Query-level failures stay local to the metric key that issued them.
    /// Only an unreachable source or a broken baseline/settings file is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            InfrastructureError::TargetNotFound { .. }
                | InfrastructureError::Database(_)
                | InfrastructureError::Json(_)
        )
    }
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<sqlx::Error> for InfrastructureError {
    fn from(err: sqlx::Error) -> Self {
        InfrastructureError::Database(DatabaseError::Sqlite(err))
    }
}
