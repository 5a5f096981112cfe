// driftgate-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid gate configuration: {0}")]
    #[diagnostic(
        code(driftgate::domain::config),
        help("Check thresholds, window size and mart names (plain SQL identifiers).")
    )]
    InvalidConfig(String),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::InvalidConfig(errors.to_string())
    }
}
