// driftgate-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts towards the external sources (warehouse, vector store).
pub mod ports;

// 2. Domain
// Snapshots, baselines, detector policies, failure reports.
// Depends on NOTHING else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB, Chroma, JSON baseline store, settings files.
pub mod infrastructure;

// 4. Application (Use Cases)
// Metric collection and the gate runner.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::GateError;
