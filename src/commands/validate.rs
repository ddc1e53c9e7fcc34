//! Validate command: read-only consistency check.
//!
//! Succeeds exactly when a migrate run with the same configuration would
//! apply nothing (repeat-always scripts aside). Never takes locks and never
//! writes, so it is safe to run next to live runners.

use crate::commands::args::EngineArgs;
use crate::libs::engine::Engine;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

pub fn cmd(args: ValidateArgs) -> Result<()> {
    let mut engine = Engine::new(args.engine.into_config()?)?;
    engine.validate()
}
