//! Command-line interface for the sqlevo migration engine.
//!
//! One invocation runs exactly one command; the exit code is zero on success
//! and non-zero whenever a command raises.
//!
//! ## Usage
//!
//! ```bash
//! sqlevo migrate -d app.db -l migrations   # apply pending scripts
//! sqlevo validate -d app.db                # check scripts against history
//! sqlevo repair -d app.db                  # accept edited script checksums
//! sqlevo info -d app.db                    # show history and pending work
//! sqlevo erase -d app.db --yes             # wipe managed schemas
//! ```

pub mod args;
pub mod erase;
pub mod info;
pub mod migrate;
pub mod repair;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// The subcommands the engine can execute.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Bring the database schema to the target version
    #[command(about = "Apply pending migration scripts")]
    Migrate(migrate::MigrateArgs),

    /// Check that scripts and the migration history are consistent
    #[command(about = "Validate scripts against the applied history")]
    Validate(validate::ValidateArgs),

    /// Accept current script checksums into the history
    #[command(about = "Repair drifted checksums in the history")]
    Repair(repair::RepairArgs),

    /// Drop or empty every schema the engine manages
    #[command(about = "Erase managed schemas")]
    Erase(erase::EraseArgs),

    /// Show the history and pending work as a table
    #[command(about = "Display migration status")]
    Info(info::InfoArgs),
}

/// The main CLI structure that parses command-line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parses command-line arguments and executes the corresponding command.
    pub fn menu() -> Result<()> {
        let cli = Self::parse();

        match cli.command {
            Commands::Migrate(args) => migrate::cmd(args),
            Commands::Validate(args) => validate::cmd(args),
            Commands::Repair(args) => repair::cmd(args),
            Commands::Erase(args) => erase::cmd(args),
            Commands::Info(args) => info::cmd(args),
        }
    }
}
