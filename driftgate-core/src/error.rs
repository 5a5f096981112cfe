// driftgate-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum GateError {
    // --- DOMAIN ERRORS (configuration rules, report parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (sources, baseline storage, IO) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl GateError {
    /// Source-level and storage-level failures abort the whole run.
    /// Everything else is local to one metric key.
    pub fn is_fatal(&self) -> bool {
        match self {
            GateError::Infrastructure(e) => e.is_fatal(),
            GateError::Domain(_) => true,
            GateError::InternalError(_) => false,
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Infrastructure(InfrastructureError::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        let source = GateError::from(InfrastructureError::SourceUnavailable {
            source_name: "warehouse.duckdb".into(),
            reason: "no such file".into(),
        });
        assert!(source.is_fatal());

        let target = GateError::from(InfrastructureError::TargetNotFound {
            target: "documents".into(),
            source_name: "chroma_store".into(),
        });
        assert!(!target.is_fatal());

        let corrupt = GateError::from(InfrastructureError::StorageCorrupt {
            path: "baseline.json".into(),
            reason: "expected value at line 1".into(),
        });
        assert!(corrupt.is_fatal());
    }
}
