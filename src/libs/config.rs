//! Configuration management for the migration engine.
//!
//! Options come from three layers, later ones winning: built-in defaults,
//! an optional JSON configuration file (`sqlevo.json` in the working
//! directory, or an explicit `--config` path), and command-line flags. A
//! `.env` file loaded at startup lets the database location come from the
//! `SQLEVO_DATABASE` environment variable, which keeps connection details out
//! of committed configuration.
//!
//! ## Example file
//!
//! ```json
//! {
//!     "database": "app.db",
//!     "locations": ["migrations"],
//!     "target_version": "2.1",
//!     "placeholders": { "table_prefix": "app_" }
//! }
//! ```

use crate::db::statements::Placeholders;
use crate::libs::loader::ScriptNaming;
use crate::libs::messages::Message;
use crate::libs::version::Version;
use crate::msg_error_anyhow;
use anyhow::Result;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration file looked up in the working directory by default.
pub const CONFIG_FILE_NAME: &str = "sqlevo.json";

/// Environment variable naming the database file when the config omits it.
pub const DATABASE_ENV_VAR: &str = "SQLEVO_DATABASE";

/// Transaction policy for a migration run.
///
/// - `CommitEach`: every script commits on its own (default).
/// - `CommitAll`: all scripts share one ambient transaction, committed at
///   the end of a fully successful run.
/// - `RollbackAll`: like `CommitAll` but always rolled back, a dry run that
///   exercises every script without persisting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    CommitEach,
    CommitAll,
    RollbackAll,
}

impl FromStr for TransactionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit-each" | "commit_each" => Ok(TransactionMode::CommitEach),
            "commit-all" | "commit_all" => Ok(TransactionMode::CommitAll),
            "rollback-all" | "rollback_all" => Ok(TransactionMode::RollbackAll),
            other => Err(msg_error_anyhow!(Message::InvalidTransactionMode(other.to_string()))),
        }
    }
}

/// All engine options with their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file; falls back to `SQLEVO_DATABASE`.
    pub database: Option<PathBuf>,
    /// Schemas to manage; empty means the connection's current schema.
    pub schemas: Vec<String>,
    pub metadata_table_name: String,
    /// Defaults to the first managed schema.
    pub metadata_table_schema: Option<String>,
    /// Directories scanned for migration scripts.
    pub locations: Vec<PathBuf>,
    /// Inclusive lower bound for versioned scripts; unset means no bound.
    pub start_version: Option<String>,
    /// Inclusive upper bound for versioned scripts; unset means no bound.
    pub target_version: Option<String>,
    /// Permits applying gap versions behind the last applied one.
    pub out_of_order: bool,
    /// Script file encoding label, e.g. `utf-8` or `windows-1251`.
    pub encoding: String,
    pub transaction_mode: TransactionMode,
    /// Cross-process lock discipline; disable only for single-runner setups.
    pub enable_cluster_mode: bool,
    pub is_erase_disabled: bool,
    /// On validation failure, erase the managed schemas and re-apply
    /// everything instead of failing. Destructive; meant for throwaway
    /// development databases.
    pub must_erase_on_validation_error: bool,
    pub retry_repeatable_migrations_until_no_error: bool,
    /// Record pending versioned scripts as applied without executing them.
    pub skip_next_migrations: bool,
    /// Per-statement timeout in seconds.
    pub command_timeout_secs: Option<u64>,
    // Script naming convention.
    pub sql_migration_prefix: String,
    pub sql_repeatable_migration_prefix: String,
    pub sql_migration_separator: String,
    pub sql_migration_suffix: String,
    // Placeholder substitution.
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
    pub placeholders: HashMap<String, String>,
    // Lock acquisition retry policy: exponential backoff between
    // `lock_retry_initial_ms` and `lock_retry_ceiling_ms`, bounded by an
    // overall `lock_timeout_secs` deadline.
    pub lock_retry_initial_ms: u64,
    pub lock_retry_ceiling_ms: u64,
    pub lock_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            schemas: Vec::new(),
            metadata_table_name: "changelog".to_string(),
            metadata_table_schema: None,
            locations: vec![PathBuf::from("migrations")],
            start_version: None,
            target_version: None,
            out_of_order: false,
            encoding: "utf-8".to_string(),
            transaction_mode: TransactionMode::CommitEach,
            enable_cluster_mode: true,
            is_erase_disabled: false,
            must_erase_on_validation_error: false,
            retry_repeatable_migrations_until_no_error: false,
            skip_next_migrations: false,
            command_timeout_secs: None,
            sql_migration_prefix: "V".to_string(),
            sql_repeatable_migration_prefix: "R".to_string(),
            sql_migration_separator: "__".to_string(),
            sql_migration_suffix: ".sql".to_string(),
            placeholder_prefix: "${".to_string(),
            placeholder_suffix: "}".to_string(),
            placeholders: HashMap::new(),
            lock_retry_initial_ms: 500,
            lock_retry_ceiling_ms: 3000,
            lock_timeout_secs: 300,
        }
    }
}

impl Config {
    /// Loads the configuration file, or defaults when none is present.
    ///
    /// An explicitly requested file must exist; the conventional
    /// `sqlevo.json` is optional.
    pub fn read(path: Option<&Path>) -> Result<Config> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILE_NAME), false),
        };
        if !path.is_file() {
            if required {
                return Err(msg_error_anyhow!(Message::ConfigFileNotFound(path.display().to_string())));
            }
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| msg_error_anyhow!(Message::ConfigParseError(path.display().to_string(), e.to_string())))
    }

    /// Resolves the database file from config or environment.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        if let Ok(path) = env::var(DATABASE_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        Err(msg_error_anyhow!(Message::DatabaseNotConfigured))
    }

    /// Configured start version, `Min` when unset.
    pub fn start_version(&self) -> Result<Version> {
        self.start_version.as_deref().map(Version::parse).transpose().map(|v| v.unwrap_or(Version::Min))
    }

    /// Configured target version, `Max` when unset.
    pub fn target_version(&self) -> Result<Version> {
        self.target_version.as_deref().map(Version::parse).transpose().map(|v| v.unwrap_or(Version::Max))
    }

    pub fn naming(&self) -> ScriptNaming {
        ScriptNaming {
            migration_prefix: self.sql_migration_prefix.clone(),
            repeatable_prefix: self.sql_repeatable_migration_prefix.clone(),
            separator: self.sql_migration_separator.clone(),
            suffix: self.sql_migration_suffix.clone(),
        }
    }

    pub fn placeholder_settings(&self) -> Placeholders {
        Placeholders::new(self.placeholder_prefix.clone(), self.placeholder_suffix.clone(), self.placeholders.clone())
    }

    /// Resolves the configured encoding label.
    pub fn script_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.as_bytes()).ok_or_else(|| msg_error_anyhow!(Message::UnknownEncoding(self.encoding.clone())))
    }
}
