// driftgate/src/commands/mod.rs

pub mod embedding_drift;
pub mod failures;
pub mod row_count;

use driftgate_core::application::GateOutcome;
use driftgate_core::domain::config::RunMode;

pub(crate) fn run_mode(update_baseline: bool) -> RunMode {
    if update_baseline {
        RunMode::UpdateBaseline
    } else {
        RunMode::Check
    }
}

/// Final console line and process exit code of a gate run.
pub(crate) fn conclude(outcome: &GateOutcome) -> i32 {
    match outcome.mode {
        RunMode::UpdateBaseline if outcome.baseline_updated => {
            println!("\n✨ Baseline updated.");
        }
        RunMode::UpdateBaseline => println!("\n✨ Nothing to record."),
        RunMode::Check if outcome.passed() => println!("\n✨ Gate passed."),
        RunMode::Check => eprintln!(
            "\n❌ Gate failed: {} anomaly(ies) detected.",
            outcome.report.len()
        ),
    }
    outcome.exit_code()
}
