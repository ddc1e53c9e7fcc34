//! Metadata history table: every action the engine takes, persisted.
//!
//! The history table (default name `changelog`) records schema adoption,
//! start-version markers, applied migrations with their checksums, and the
//! cluster lock row. It is the single source of truth the reconciler compares
//! source scripts against.
//!
//! ## Table layout
//!
//! - `id`: monotonically assigned integer (AUTOINCREMENT, never reused)
//! - `type`: entry kind, see [`MetadataType`]
//! - `version`: label text for migration and start-version entries
//! - `name`: script name for migration entries, schema name for schema marks
//! - `description`, `checksum`, `installed_on`, `installed_by`
//! - `success`, `execution_time`: set for migration entries
//!
//! ## Locking
//!
//! The table doubles as the cluster metadata lock: [`MetadataStore::try_lock`]
//! inserts a row with the fixed id 0, which AUTOINCREMENT never hands out.
//! The primary key turns a concurrent locker into a constraint violation,
//! reported as contention rather than an error.

use crate::libs::messages::Message;
use crate::libs::script::{MigrationScript, ScriptCategory};
use crate::libs::version::Version;
use crate::msg_error_anyhow;
use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, ErrorCode};
use std::cell::RefCell;
use std::env;
use std::rc::Rc;

/// Kinds of entry the history table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataType {
    /// A schema this engine created and may later drop.
    NewSchema,
    /// A schema adopted while empty; its contents may later be erased.
    EmptySchema,
    /// The one-time marker declaring versions below it intentionally skipped.
    StartVersion,
    Migration,
    RepeatableMigration,
    /// The cluster lock row, never part of the visible history.
    Lock,
}

impl MetadataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataType::NewSchema => "new_schema",
            MetadataType::EmptySchema => "empty_schema",
            MetadataType::StartVersion => "start_version",
            MetadataType::Migration => "migration",
            MetadataType::RepeatableMigration => "repeatable_migration",
            MetadataType::Lock => "lock",
        }
    }

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "new_schema" => MetadataType::NewSchema,
            "empty_schema" => MetadataType::EmptySchema,
            "start_version" => MetadataType::StartVersion,
            "migration" => MetadataType::Migration,
            "repeatable_migration" => MetadataType::RepeatableMigration,
            "lock" => MetadataType::Lock,
            other => return Err(msg_error_anyhow!(Message::MetadataCorrupted(format!("unknown entry type '{}'", other)))),
        })
    }
}

/// One persisted row of the history table.
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub id: i64,
    pub kind: MetadataType,
    pub version: Option<Version>,
    pub name: String,
    pub description: String,
    pub checksum: Option<String>,
    pub installed_on: DateTime<Local>,
    pub installed_by: String,
    pub success: Option<bool>,
    pub execution_time_ms: Option<i64>,
}

/// Abstraction over the persisted history table.
///
/// Query methods never create the table; callers check [`table_exists`]
/// (or call [`create_if_not_exists`]) first.
///
/// [`table_exists`]: MetadataStore::table_exists
/// [`create_if_not_exists`]: MetadataStore::create_if_not_exists
pub trait MetadataStore {
    fn table_exists(&self) -> Result<bool>;

    fn create_if_not_exists(&mut self) -> Result<()>;

    /// True once at least one migration entry exists.
    fn is_initialized(&self) -> Result<bool>;

    /// Maximum version over successful migration entries; `Min` if none.
    fn last_applied_version(&self) -> Result<Version>;

    /// Version of the start-version marker, if one was ever persisted.
    fn start_version(&self) -> Result<Option<Version>>;

    /// Every entry except the lock row, in history order.
    fn all_entries(&self) -> Result<Vec<MetadataEntry>>;

    /// Successful versioned migration entries, in history order.
    fn applied_migrations(&self) -> Result<Vec<MetadataEntry>>;

    /// Successful repeatable migration entries, in history order: by id for
    /// drivers with monotonic ids, by `(installed_on, name)` otherwise.
    fn applied_repeatable_migrations(&self) -> Result<Vec<MetadataEntry>>;

    /// Appends a non-migration entry (schema mark or start-version marker).
    fn save(&mut self, kind: MetadataType, version: Option<&Version>, description: &str, name: &str) -> Result<()>;

    /// Appends a migration entry with the script's current checksum.
    fn save_migration(&mut self, script: &MigrationScript, success: bool, elapsed_ms: i64) -> Result<()>;

    fn update_checksum(&mut self, id: i64, checksum: &str) -> Result<()>;

    /// True when the engine created this schema and may drop it.
    fn can_drop_schema(&self, schema: &str) -> Result<bool>;

    /// True when the schema was adopted empty and may be erased.
    fn can_erase_schema(&self, schema: &str) -> Result<bool>;

    /// True when an empty-schema mark already exists for this schema.
    fn empty_schema_marked(&self, schema: &str) -> Result<bool>;

    /// Attempts the metadata-table lock; false means another runner holds it.
    fn try_lock(&mut self) -> Result<bool>;

    fn release_lock(&mut self) -> Result<()>;
}

/// Fixed id of the lock row; AUTOINCREMENT starts at 1, so 0 is always free.
const LOCK_ROW_ID: i64 = 0;

/// SQLite-backed [`MetadataStore`] sharing the driver's connection.
pub struct SqliteMetadata {
    conn: Rc<RefCell<Connection>>,
    schema: String,
    table: String,
    monotonic_id: bool,
    installed_by: String,
}

impl SqliteMetadata {
    pub fn new(conn: Rc<RefCell<Connection>>, schema: &str, table: &str, monotonic_id: bool) -> Self {
        Self {
            conn,
            schema: schema.to_string(),
            table: table.to_string(),
            monotonic_id,
            installed_by: runner_identity(),
        }
    }

    /// Quoted `"schema"."table"` for interpolation into statements.
    fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.table)
    }

    fn select_entries(&self, where_clause: &str, order_clause: &str) -> Result<Vec<MetadataEntry>> {
        let conn = self.conn.borrow();
        let sql = format!(
            "SELECT id, type, version, name, description, checksum, installed_on, installed_by, success, execution_time
             FROM {} WHERE {} ORDER BY {}",
            self.qualified(),
            where_clause,
            order_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, DateTime<Local>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, Option<bool>>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (id, kind, version, name, description, checksum, installed_on, installed_by, success, execution_time_ms) in rows {
            entries.push(MetadataEntry {
                id,
                kind: MetadataType::from_str(&kind)?,
                version: version.as_deref().map(Version::parse).transpose()?,
                name,
                description,
                checksum,
                installed_on,
                installed_by,
                success,
                execution_time_ms,
            });
        }
        Ok(entries)
    }

    fn insert(
        &mut self,
        kind: MetadataType,
        version: Option<&Version>,
        name: &str,
        description: &str,
        checksum: Option<&str>,
        success: Option<bool>,
        execution_time_ms: Option<i64>,
    ) -> Result<()> {
        let conn = self.conn.borrow();
        let sql = format!(
            "INSERT INTO {} (type, version, name, description, checksum, installed_on, installed_by, success, execution_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            self.qualified()
        );
        conn.execute(
            &sql,
            params![
                kind.as_str(),
                version.map(|v| v.to_string()),
                name,
                description,
                checksum,
                Local::now(),
                self.installed_by,
                success,
                execution_time_ms,
            ],
        )?;
        Ok(())
    }

    fn schema_mark_exists(&self, kind: MetadataType, schema: &str) -> Result<bool> {
        let conn = self.conn.borrow();
        let sql = format!("SELECT COUNT(*) FROM {} WHERE type = ?1 AND name = ?2", self.qualified());
        let count: i64 = conn.query_row(&sql, params![kind.as_str(), schema], |row| row.get(0))?;
        Ok(count > 0)
    }
}

impl MetadataStore for SqliteMetadata {
    fn table_exists(&self) -> Result<bool> {
        let conn = self.conn.borrow();
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\".sqlite_master WHERE type = 'table' AND name = ?1",
            self.schema
        );
        let count: i64 = conn.query_row(&sql, params![self.table], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn create_if_not_exists(&mut self) -> Result<()> {
        let conn = self.conn.borrow();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                version TEXT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                checksum TEXT,
                installed_on TIMESTAMP NOT NULL,
                installed_by TEXT NOT NULL,
                success BOOLEAN,
                execution_time INTEGER
            )",
            self.qualified()
        );
        conn.execute(&sql, [])?;
        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        if !self.table_exists()? {
            return Ok(false);
        }
        let conn = self.conn.borrow();
        let sql = format!("SELECT COUNT(*) FROM {} WHERE type = 'migration'", self.qualified());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn last_applied_version(&self) -> Result<Version> {
        // Version labels compare lexicographically by component, which SQL
        // text ordering gets wrong ("10" < "2"); compare parsed labels here.
        let applied = self.applied_migrations()?;
        Ok(applied
            .into_iter()
            .filter_map(|e| e.version)
            .max()
            .unwrap_or(Version::Min))
    }

    fn start_version(&self) -> Result<Option<Version>> {
        let entries = self.select_entries("type = 'start_version'", "id")?;
        Ok(entries.into_iter().next().and_then(|e| e.version))
    }

    fn all_entries(&self) -> Result<Vec<MetadataEntry>> {
        let order = if self.monotonic_id { "id" } else { "installed_on, id" };
        self.select_entries("type != 'lock'", order)
    }

    fn applied_migrations(&self) -> Result<Vec<MetadataEntry>> {
        let order = if self.monotonic_id { "id" } else { "installed_on, name" };
        self.select_entries("type = 'migration' AND success = 1", order)
    }

    fn applied_repeatable_migrations(&self) -> Result<Vec<MetadataEntry>> {
        let order = if self.monotonic_id { "id" } else { "installed_on, name" };
        self.select_entries("type = 'repeatable_migration' AND success = 1", order)
    }

    fn save(&mut self, kind: MetadataType, version: Option<&Version>, description: &str, name: &str) -> Result<()> {
        self.insert(kind, version, name, description, None, None, None)
    }

    fn save_migration(&mut self, script: &MigrationScript, success: bool, elapsed_ms: i64) -> Result<()> {
        let kind = match script.category {
            ScriptCategory::Versioned => MetadataType::Migration,
            ScriptCategory::Repeatable => MetadataType::RepeatableMigration,
        };
        let checksum = script.checksum()?;
        self.insert(
            kind,
            script.version.as_ref(),
            &script.name,
            &script.description,
            Some(&checksum),
            Some(success),
            Some(elapsed_ms),
        )
    }

    fn update_checksum(&mut self, id: i64, checksum: &str) -> Result<()> {
        let conn = self.conn.borrow();
        let sql = format!("UPDATE {} SET checksum = ?1 WHERE id = ?2", self.qualified());
        conn.execute(&sql, params![checksum, id])?;
        Ok(())
    }

    fn can_drop_schema(&self, schema: &str) -> Result<bool> {
        self.schema_mark_exists(MetadataType::NewSchema, schema)
    }

    fn can_erase_schema(&self, schema: &str) -> Result<bool> {
        self.schema_mark_exists(MetadataType::EmptySchema, schema)
    }

    fn empty_schema_marked(&self, schema: &str) -> Result<bool> {
        self.schema_mark_exists(MetadataType::EmptySchema, schema)
    }

    fn try_lock(&mut self) -> Result<bool> {
        let conn = self.conn.borrow();
        let sql = format!(
            "INSERT INTO {} (id, type, version, name, description, checksum, installed_on, installed_by, success, execution_time)
             VALUES (?1, 'lock', NULL, 'lock', 'lock', NULL, ?2, ?3, NULL, NULL)",
            self.qualified()
        );
        match conn.execute(&sql, params![LOCK_ROW_ID, Local::now(), self.installed_by]) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn release_lock(&mut self) -> Result<()> {
        let conn = self.conn.borrow();
        let sql = format!("DELETE FROM {} WHERE id = ?1 AND type = 'lock'", self.qualified());
        conn.execute(&sql, params![LOCK_ROW_ID])?;
        Ok(())
    }
}

/// Identity recorded as `installed_by`, taken from the environment.
pub fn runner_identity() -> String {
    env::var("USER").or_else(|_| env::var("USERNAME")).unwrap_or_else(|_| "unknown".to_string())
}
