// driftgate-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod error;
pub mod fs;
pub mod report_file;
pub mod settings;
pub mod store;

pub use report_file::{load_failure_file, write_failure_report};
pub use store::JsonBaselineStore;
