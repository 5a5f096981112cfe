pub mod baseline;
pub mod config;
pub mod detection;
pub mod error;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod verdict;

// Convenient re-exports to simplify imports elsewhere
pub use baseline::{Baseline, BaselineDocument, NormBaseline, SnapshotHistory};
pub use detection::{DetectionPolicy, Detector, DriftPolicy, ZScorePolicy};
pub use error::DomainError;
pub use report::{FailureFile, FailureReport};
pub use snapshot::MetricSnapshot;
pub use verdict::{Direction, Evidence, Verdict};
