//! Repair command: reconcile stored checksums with the current scripts.
//!
//! Used after an intentional edit of an already-applied script (typically a
//! comment or formatting change): the stored checksums are overwritten with
//! the current ones, nothing is executed.

use crate::commands::args::EngineArgs;
use crate::libs::engine::Engine;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct RepairArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

pub fn cmd(args: RepairArgs) -> Result<()> {
    let mut engine = Engine::new(args.engine.into_config()?)?;
    engine.repair()
}
