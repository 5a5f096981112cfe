// driftgate-core/src/application/mod.rs

pub mod collector;
pub mod gate;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI do `use driftgate_core::application::{run_drift_gate, run_row_count_gate};`
// without knowing the internal file layout.

pub use collector::{MetricCollector, RowCountCollector, VectorNormCollector};
pub use gate::{GateOutcome, GateRunner, GateState, run_drift_gate, run_row_count_gate};
