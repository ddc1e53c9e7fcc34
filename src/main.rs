//! Main entry point for the sqlevo application.
//!
//! Handles initialization of the tracing system, environment loading and
//! delegation to the CLI handler. Exit code is non-zero on any raised error.

use anyhow::Result;
use sqlevo::commands::Cli;
use std::env;

fn main() -> Result<()> {
    // Connection details may live in a .env file next to the project.
    dotenv::dotenv().ok();

    // Initialize tracing only if debug mode is enabled
    // This prevents log output from cluttering normal CLI usage
    if env::var("SQLEVO_DEBUG").is_ok() || env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "sqlevo=debug".into()))
            .init();
    }

    Cli::menu()
}
