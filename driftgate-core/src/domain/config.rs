// driftgate-core/src/domain/config.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::domain::detection::{DetectionPolicy, DriftPolicy, ZScorePolicy, drift, zscore};
use crate::domain::error::DomainError;

pub const DEFAULT_COLLECTION: &str = "documents";
pub const DEFAULT_MART_SCHEMA: &str = "main_marts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DRIFT_BASELINE: &str = "metrics/baselines/embedding_norm.json";
pub const DEFAULT_ROW_COUNT_BASELINE: &str = "metrics/baselines/row_counts.json";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

/// Update mode establishes ground truth; check mode judges against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Check,
    UpdateBaseline,
}

/// Settings shared by every gate.
#[derive(Debug, Clone, Validate)]
pub struct GateOptions {
    pub baseline_file: PathBuf,
    pub failures_file: Option<PathBuf>,
    pub mode: RunMode,
    /// Bound on collecting from one source before it counts as unavailable.
    #[validate(range(min = 1, message = "timeout must be at least 1 second"))]
    pub source_timeout_secs: u64,
}

impl GateOptions {
    pub fn new(baseline_file: impl Into<PathBuf>) -> Self {
        Self {
            baseline_file: baseline_file.into(),
            failures_file: None,
            mode: RunMode::Check,
            source_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embedding-norm drift gate over one vector collection.
#[derive(Debug, Clone, Validate)]
pub struct DriftGateConfig {
    pub persist_dir: PathBuf,
    #[validate(length(min = 1, message = "collection name cannot be empty"))]
    pub collection: String,
    #[validate(custom(function = "validate_threshold"))]
    pub threshold_pct: f64,
    #[validate(nested)]
    pub options: GateOptions,
}

impl DriftGateConfig {
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        Ok(self)
    }

    pub fn policy(&self) -> DetectionPolicy {
        DetectionPolicy::Drift(DriftPolicy::new(self.threshold_pct))
    }
}

/// Mart row-count Z-score gate.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_retention"))]
pub struct RowCountGateConfig {
    pub duckdb: PathBuf,
    #[validate(
        length(min = 1, message = "at least one mart is required"),
        custom(function = "validate_identifiers")
    )]
    pub marts: Vec<String>,
    #[validate(custom(function = "validate_identifier"))]
    pub schema: String,
    #[validate(custom(function = "validate_threshold"))]
    pub threshold: f64,
    #[validate(range(min = 2, message = "window size must be at least 2"))]
    pub window_size: usize,
    /// Snapshots kept per mart when saving; `None` keeps everything.
    pub retain: Option<usize>,
    #[validate(nested)]
    pub options: GateOptions,
}

impl RowCountGateConfig {
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        Ok(self)
    }

    pub fn policy(&self) -> DetectionPolicy {
        DetectionPolicy::ZScore(ZScorePolicy::new(self.threshold, self.window_size))
    }
}

pub fn default_drift_threshold() -> f64 {
    drift::DEFAULT_THRESHOLD_PCT
}

pub fn default_zscore_threshold() -> f64 {
    zscore::DEFAULT_THRESHOLD
}

pub fn default_window_size() -> usize {
    zscore::DEFAULT_WINDOW_SIZE
}

// --- VALIDATORS ---

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_threshold(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(
            "threshold",
            format!("threshold must be a positive number, got {}", value),
        ))
    }
}

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(invalid(
            "identifier",
            format!("'{}' is not a plain SQL identifier", name),
        ))
    }
}

fn validate_identifiers(names: &[String]) -> Result<(), ValidationError> {
    names.iter().try_for_each(|name| validate_identifier(name))
}

fn validate_retention(config: &RowCountGateConfig) -> Result<(), ValidationError> {
    match config.retain {
        Some(retain) if retain < config.window_size => Err(invalid(
            "retain",
            format!(
                "retain ({}) must be at least the window size ({})",
                retain, config.window_size
            ),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_count_config() -> RowCountGateConfig {
        RowCountGateConfig {
            duckdb: PathBuf::from("warehouse.duckdb"),
            marts: vec!["orders".into(), "users".into()],
            schema: DEFAULT_MART_SCHEMA.into(),
            threshold: default_zscore_threshold(),
            window_size: default_window_size(),
            retain: None,
            options: GateOptions::new(DEFAULT_ROW_COUNT_BASELINE),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(row_count_config().validated().is_ok());
    }

    #[test]
    fn test_rejects_sql_in_mart_names() {
        let mut config = row_count_config();
        config.marts.push("orders; DROP TABLE users".into());
        assert!(matches!(config.validated(), Err(DomainError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_marts_and_small_window() {
        let mut config = row_count_config();
        config.marts.clear();
        assert!(config.validated().is_err());

        let mut config = row_count_config();
        config.window_size = 1;
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        for threshold in [0.0, -1.0, f64::NAN] {
            let mut config = row_count_config();
            config.threshold = threshold;
            assert!(config.validated().is_err());
        }
    }

    #[test]
    fn test_retention_must_cover_window() {
        let mut config = row_count_config();
        config.retain = Some(3);
        assert!(config.validated().is_err());

        let mut config = row_count_config();
        config.retain = Some(30);
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_drift_config_validation() {
        let config = DriftGateConfig {
            persist_dir: PathBuf::from("chroma_store"),
            collection: String::new(),
            threshold_pct: default_drift_threshold(),
            options: GateOptions::new(DEFAULT_DRIFT_BASELINE),
        };
        assert!(config.validated().is_err());
    }
}
