// driftgate-core/src/infrastructure/settings.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::infrastructure::error::InfrastructureError;

pub const SETTINGS_FILE: &str = "driftgate.yaml";

/// Optional `driftgate.yaml`. Every field is optional: values found here sit
/// between built-in defaults and environment/CLI flags.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSettings {
    #[serde(default)]
    pub embedding_drift: DriftSettings,
    #[serde(default)]
    pub row_count: RowCountSettings,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriftSettings {
    pub persist_dir: Option<PathBuf>,
    pub collection: Option<String>,
    pub baseline_file: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub failures_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowCountSettings {
    pub duckdb: Option<PathBuf>,
    pub marts: Option<Vec<String>>,
    pub schema: Option<String>,
    pub baseline_file: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub window_size: Option<usize>,
    pub retain: Option<usize>,
    pub failures_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// An explicit path must exist; otherwise `driftgate.yaml` in `working_dir`
/// is used when present, and empty settings when not.
#[instrument]
pub fn load_settings(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<GateSettings, InfrastructureError> {
    let path = match explicit {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) => {
            return Err(InfrastructureError::ConfigNotFound(
                path.display().to_string(),
            ));
        }
        None => {
            let candidate = working_dir.join(SETTINGS_FILE);
            if !candidate.is_file() {
                return Ok(GateSettings::default());
            }
            candidate
        }
    };

    info!(path = ?path, "Loading gate settings");
    let content = fs::read_to_string(&path)?;
    // An empty file is valid YAML `null`
    if content.trim().is_empty() {
        return Ok(GateSettings::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}
