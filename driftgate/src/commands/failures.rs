// driftgate/src/commands/failures.rs
//
// USE CASE: Render a failures file as notification bullets.

use std::path::PathBuf;

use driftgate_core::infrastructure::load_failure_file;

pub fn execute(file: PathBuf, limit: usize) -> anyhow::Result<i32> {
    match load_failure_file(&file).into_report() {
        Ok(report) if report.is_empty() => {
            println!("✅ No failures recorded in {}", file.display());
            Ok(0)
        }
        Ok(report) => {
            println!("🚨 {} failure(s):", report.len());
            for line in report.bullets(limit) {
                println!("{}", line);
            }
            Ok(0)
        }
        Err(reason) => {
            eprintln!("❌ Could not read failures file: {}", reason);
            Ok(1)
        }
    }
}
