// driftgate/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use driftgate_core::domain::DomainError;
use driftgate_core::infrastructure::error::InfrastructureError;

/// Exit code for configuration that cannot be turned into a valid gate.
const EXIT_INVALID_CONFIG: i32 = 2;

#[tokio::main]
async fn main() {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug driftgate row-count ... to see state transitions
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_file = cli.config.as_deref();

    let result = match cli.command {
        // --- USE CASE: EMBEDDING DRIFT GATE ---
        Commands::EmbeddingDrift(args) => {
            commands::embedding_drift::execute(config_file, args).await
        }
        // --- USE CASE: ROW-COUNT GATE ---
        Commands::RowCount(args) => commands::row_count::execute(config_file, args).await,
        // --- USE CASE: RENDER FAILURES FILE ---
        Commands::Failures { file, limit } => commands::failures::execute(file, limit),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\n💥 CRITICAL GATE ERROR: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<DomainError>().is_some() {
        return EXIT_INVALID_CONFIG;
    }
    match error.downcast_ref::<InfrastructureError>() {
        Some(InfrastructureError::ConfigNotFound(_) | InfrastructureError::YamlError(_)) => {
            EXIT_INVALID_CONFIG
        }
        _ => 1,
    }
}
