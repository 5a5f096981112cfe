// driftgate-core/src/infrastructure/report_file.rs

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::domain::report::{FailureFile, FailureReport};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

pub fn write_failure_report(path: &Path, report: &FailureReport) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(report)?;
    atomic_write(path, content)
}

/// Reads a failures file the way the notification sender does.
pub fn load_failure_file(path: &Path) -> FailureFile {
    match fs::read_to_string(path) {
        Ok(content) => FailureFile::parse(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            FailureFile::ParseError(format!("failures file not found: {}", path.display()))
        }
        Err(e) => FailureFile::ParseError(format!("unable to read failures file: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_written_report_is_read_back_structured() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out/failures.json");
        let report = FailureReport {
            failures: vec!["orders: drop detected (Z=-4.00, current=0, mean=100.0, window=7)".into()],
        };

        write_failure_report(&path, &report)?;

        assert_eq!(
            load_failure_file(&path),
            FailureFile::Structured(report.failures.clone())
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_parse_error() -> Result<()> {
        let dir = tempdir()?;
        assert!(matches!(
            load_failure_file(&dir.path().join("missing.json")),
            FailureFile::ParseError(msg) if msg.contains("not found")
        ));
        Ok(())
    }
}
