//! Info command: tabular overview of history and pending work.

use crate::commands::args::EngineArgs;
use crate::libs::engine::Engine;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

pub fn cmd(args: InfoArgs) -> Result<()> {
    let mut engine = Engine::new(args.engine.into_config()?)?;
    engine.info()?;
    Ok(())
}
