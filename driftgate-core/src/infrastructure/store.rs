// driftgate-core/src/infrastructure/store.rs

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

/// Baseline persistence as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonBaselineStore {
    path: PathBuf,
}

impl JsonBaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file does not exist yet (first run).
    /// An existing file that does not parse is `StorageCorrupt`, never `None`.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load<D: DeserializeOwned>(&self) -> Result<Option<D>, InfrastructureError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No baseline file yet");
                return Ok(None);
            }
            Err(e) => return Err(InfrastructureError::Io(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| InfrastructureError::StorageCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Replaces the file atomically with the full document.
    #[instrument(skip(self, document), fields(path = ?self.path))]
    pub fn save<D: Serialize>(&self, document: &D) -> Result<(), InfrastructureError> {
        let content = serde_json::to_string_pretty(document)?;
        atomic_write(&self.path, content)?;
        info!("Baseline written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::baseline::{HistoryEntry, NormBaseline, SnapshotHistory};
    use anyhow::Result;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_absent_not_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonBaselineStore::new(dir.path().join("nope/baseline.json"));
        let loaded: Option<NormBaseline> = store.load()?;
        assert!(loaded.is_none());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_surfaced() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("baseline.json");
        fs::write(&path, "{ not json")?;

        let res: Result<Option<NormBaseline>, _> = JsonBaselineStore::new(&path).load();
        assert!(matches!(res, Err(InfrastructureError::StorageCorrupt { .. })));
        Ok(())
    }

    #[test]
    fn test_wrong_shape_is_corrupt() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("baseline.json");
        fs::write(&path, r#"{"snapshots": []}"#)?;

        let res: Result<Option<NormBaseline>, _> = JsonBaselineStore::new(&path).load();
        assert!(matches!(res, Err(InfrastructureError::StorageCorrupt { .. })));
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonBaselineStore::new(dir.path().join("metrics/row_counts.json"));
        let history = SnapshotHistory {
            snapshots: vec![HistoryEntry {
                timestamp: Utc::now(),
                mart: "orders".into(),
                count: 12,
            }],
        };

        store.save(&history)?;
        let loaded: Option<SnapshotHistory> = store.load()?;

        let loaded = loaded.unwrap();
        assert_eq!(loaded.snapshots.len(), 1);
        assert_eq!(loaded.snapshots[0].count, 12);
        Ok(())
    }
}
