//! Migrate command: bring the database to the target version.

use crate::commands::args::EngineArgs;
use crate::libs::engine::Engine;
use crate::libs::formatter::format_elapsed_ms;
use crate::libs::messages::Message;
use crate::msg_info;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Record pending migrations as applied without executing them
    #[arg(long)]
    skip_next_migrations: bool,

    /// On validation failure, erase everything and re-apply (destructive)
    #[arg(long)]
    erase_on_validation_error: bool,

    /// Keep retrying failed repeatable migrations while progress is made
    #[arg(long)]
    retry_repeatable: bool,
}

pub fn cmd(args: MigrateArgs) -> Result<()> {
    let mut config = args.engine.into_config()?;
    if args.skip_next_migrations {
        config.skip_next_migrations = true;
    }
    if args.erase_on_validation_error {
        config.must_erase_on_validation_error = true;
    }
    if args.retry_repeatable {
        config.retry_repeatable_migrations_until_no_error = true;
    }

    let mut engine = Engine::new(config)?;
    engine.migrate()?;
    msg_info!(Message::RunDuration(format_elapsed_ms(engine.summary().total_time.as_millis() as i64)));
    Ok(())
}
