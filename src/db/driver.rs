//! The database driver capability set the engine runs against.
//!
//! The engine core never speaks SQL dialects itself. Everything
//! database-specific sits behind the [`Driver`] trait: schema lifecycle,
//! server-side locking, statement preparation, transaction control and raw
//! execution over one long-lived session. The shipped implementation is
//! [`crate::db::sqlite::SqliteDriver`]; other engines plug in by implementing
//! this trait plus [`crate::db::metadata::MetadataStore`].
//!
//! ## Capability flags
//!
//! Dialect quirks are expressed as flags rather than type checks:
//!
//! - `has_monotonic_id`: whether the metadata table assigns monotonically
//!   increasing ids. Stores for engines without one (Cassandra-style) order
//!   repeatable history by `(installed_on, name)` instead.
//! - `supports_transactions`: whether begin/commit/rollback are meaningful.
//!   When false the executor runs every statement bare.

use crate::db::metadata::MetadataStore;
use crate::db::statements::{Placeholders, SqlStatement};
use anyhow::Result;
use std::time::Duration;

/// One live database session with dialect-specific operations.
///
/// All calls are synchronous; the engine is single-threaded and parallelism
/// exists only between independent runner processes, which is what the two
/// locks serialize.
pub trait Driver {
    /// Name of the schema the connection points at by default.
    fn current_schema(&self) -> Result<String>;

    fn schema_exists(&self, name: &str) -> Result<bool>;

    /// True when the schema holds no user objects.
    fn schema_is_empty(&self, name: &str) -> Result<bool>;

    fn create_schema(&mut self, name: &str) -> Result<()>;

    fn drop_schema(&mut self, name: &str) -> Result<()>;

    /// Drops every object in the schema but keeps the schema itself.
    fn erase_schema(&mut self, name: &str) -> Result<()>;

    /// Attempts the server-side application lock; false means contention.
    fn try_acquire_application_lock(&mut self) -> Result<bool>;

    /// Best-effort release; failures are logged by the caller, never fatal.
    fn release_application_lock(&mut self) -> Result<()>;

    /// Opens the metadata history store for `schema`.`table` on this session.
    fn metadata_store(&self, schema: &str, table: &str) -> Result<Box<dyn MetadataStore>>;

    /// Substitutes placeholders and splits a script body into statements.
    fn load_statements(&self, body: &str, placeholders: &Placeholders) -> Result<Vec<SqlStatement>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// True while a transaction opened through [`Driver::begin`] is pending.
    fn in_transaction(&self) -> bool;

    /// Executes one statement, honoring the per-statement timeout if given.
    fn execute(&mut self, sql: &str, timeout: Option<Duration>) -> Result<()>;

    fn has_monotonic_id(&self) -> bool {
        true
    }

    fn supports_transactions(&self) -> bool {
        true
    }
}
