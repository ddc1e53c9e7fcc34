//! Shared command-line options common to every subcommand.
//!
//! Each subcommand flattens [`EngineArgs`] into its own argument struct and
//! calls [`EngineArgs::into_config`] to resolve the final configuration:
//! file values first, command-line flags on top.

use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::msg_error_anyhow;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct EngineArgs {
    /// Path to the configuration file (default: sqlevo.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file to manage
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Directory containing migration scripts; repeat for several
    #[arg(short, long)]
    location: Vec<PathBuf>,

    /// Schema to manage; repeat for several
    #[arg(long)]
    schema: Vec<String>,

    /// Name of the metadata history table
    #[arg(long)]
    metadata_table: Option<String>,

    /// Lowest version taken into account (one-time setting)
    #[arg(long)]
    start_version: Option<String>,

    /// Highest version applied by migrate
    #[arg(long)]
    target_version: Option<String>,

    /// Apply gap versions behind the last applied one
    #[arg(long)]
    out_of_order: bool,

    /// Transaction policy: commit-each, commit-all or rollback-all
    #[arg(long)]
    transaction_mode: Option<String>,

    /// Placeholder as key=value; repeat for several
    #[arg(short, long)]
    placeholder: Vec<String>,

    /// Per-statement timeout in seconds
    #[arg(long)]
    command_timeout: Option<u64>,

    /// Script file encoding, e.g. utf-8 or windows-1251
    #[arg(long)]
    encoding: Option<String>,

    /// Disable cross-process locking (single-runner setups only)
    #[arg(long)]
    no_cluster: bool,
}

impl EngineArgs {
    /// Resolves the effective configuration: file, then flags on top.
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::read(self.config.as_deref())?;
        if let Some(database) = self.database {
            config.database = Some(database);
        }
        if !self.location.is_empty() {
            config.locations = self.location;
        }
        if !self.schema.is_empty() {
            config.schemas = self.schema;
        }
        if let Some(table) = self.metadata_table {
            config.metadata_table_name = table;
        }
        if let Some(version) = self.start_version {
            config.start_version = Some(version);
        }
        if let Some(version) = self.target_version {
            config.target_version = Some(version);
        }
        if self.out_of_order {
            config.out_of_order = true;
        }
        if let Some(mode) = self.transaction_mode {
            config.transaction_mode = mode.parse()?;
        }
        for placeholder in self.placeholder {
            let (key, value) = placeholder
                .split_once('=')
                .ok_or_else(|| msg_error_anyhow!(Message::InvalidPlaceholder(placeholder.clone())))?;
            config.placeholders.insert(key.to_string(), value.to_string());
        }
        if let Some(timeout) = self.command_timeout {
            config.command_timeout_secs = Some(timeout);
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if self.no_cluster {
            config.enable_cluster_mode = false;
        }
        Ok(config)
    }
}
