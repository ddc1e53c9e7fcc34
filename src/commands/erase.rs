//! Erase command: wipe every schema the engine is allowed to.
//!
//! Destructive, so it asks for confirmation unless `--yes` is passed or the
//! run is non-interactive. Schemas the engine neither created nor adopted
//! empty are skipped and counted.

use crate::commands::args::EngineArgs;
use crate::libs::engine::Engine;
use crate::libs::messages::Message;
use crate::msg_info;
use anyhow::Result;
use clap::Args;
use dialoguer::Confirm;

#[derive(Debug, Args)]
pub struct EraseArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

pub fn cmd(args: EraseArgs) -> Result<()> {
    let config = args.engine.into_config()?;
    let database = config.database_path()?.display().to_string();

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(Message::ConfirmErase(database).to_string())
            .default(false)
            .interact()?;
        if !confirmed {
            msg_info!(Message::EraseCancelled);
            return Ok(());
        }
    }

    let mut engine = Engine::new(config)?;
    engine.erase()
}
