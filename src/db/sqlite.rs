//! SQLite implementation of the database driver capability set.
//!
//! Holds the single long-lived [`rusqlite::Connection`] every component of a
//! run shares: the driver itself, the metadata store and the executor all
//! work through one session so transactional state is consistent.
//!
//! ## Dialect mapping
//!
//! SQLite has no server-side schema objects; a "schema" here is an attached
//! database name and `main` always exists. Consequences:
//!
//! - `create_schema` cannot be honored (attaching needs a file path decided
//!   by the operator) and reports a configuration error; in practice it is
//!   never reached because `main` exists.
//! - `drop_schema` falls back to erasing the schema contents; `main` cannot
//!   be detached.
//! - The application lock maps onto SQLite's own writer lock: there is no
//!   separate advisory lock to take, so acquisition always succeeds and
//!   cross-runner serialization comes from the metadata lock row and the
//!   database-level write locking.

use crate::db::driver::Driver;
use crate::db::metadata::{MetadataStore, SqliteMetadata};
use crate::db::statements::{self, Placeholders, SqlStatement};
use crate::libs::messages::Message;
use crate::msg_debug;
use crate::msg_error_anyhow;
use anyhow::Result;
use rusqlite::{params, Connection};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

pub struct SqliteDriver {
    conn: Rc<RefCell<Connection>>,
    txn_open: bool,
}

impl SqliteDriver {
    /// Opens the database file, creating it when absent.
    pub fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // Referential integrity stays on for migration scripts; erase turns
        // it off temporarily to drop tables in arbitrary order.
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
            txn_open: false,
        })
    }

    /// Objects of one type in a schema, excluding SQLite internals.
    fn objects(&self, schema: &str, object_type: &str) -> Result<Vec<String>> {
        let conn = self.conn.borrow();
        let sql = format!(
            "SELECT name FROM \"{}\".sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%'",
            schema
        );
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map(params![object_type], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Double-quotes an identifier for interpolation into DDL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Driver for SqliteDriver {
    fn current_schema(&self) -> Result<String> {
        Ok("main".to_string())
    }

    fn schema_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn.borrow();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pragma_database_list WHERE name = ?1", params![name], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn schema_is_empty(&self, name: &str) -> Result<bool> {
        let conn = self.conn.borrow();
        let sql = format!("SELECT COUNT(*) FROM \"{}\".sqlite_master WHERE name NOT LIKE 'sqlite_%'", name);
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count == 0)
    }

    fn create_schema(&mut self, name: &str) -> Result<()> {
        // Attaching a database needs a file path only the operator can pick.
        Err(msg_error_anyhow!(Message::SchemaCreateUnsupported(name.to_string())))
    }

    fn drop_schema(&mut self, name: &str) -> Result<()> {
        msg_debug!(format!("SQLite cannot detach '{}', erasing its contents instead", name));
        self.erase_schema(name)
    }

    fn erase_schema(&mut self, name: &str) -> Result<()> {
        {
            let conn = self.conn.borrow();
            conn.execute("PRAGMA foreign_keys = OFF", [])?;
        }
        // Triggers and views first so nothing references the tables, then
        // tables, then any indexes that survived their table.
        for (object_type, drop_kind) in [("trigger", "TRIGGER"), ("view", "VIEW"), ("table", "TABLE"), ("index", "INDEX")] {
            for object in self.objects(name, object_type)? {
                let conn = self.conn.borrow();
                let sql = format!("DROP {} IF EXISTS \"{}\".{}", drop_kind, name, quote_ident(&object));
                conn.execute_batch(&sql)?;
            }
        }
        let conn = self.conn.borrow();
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(())
    }

    fn try_acquire_application_lock(&mut self) -> Result<bool> {
        // SQLite's writer lock is the database-level lock; nothing separate
        // to take here.
        msg_debug!("Application lock delegated to the SQLite writer lock");
        Ok(true)
    }

    fn release_application_lock(&mut self) -> Result<()> {
        Ok(())
    }

    fn metadata_store(&self, schema: &str, table: &str) -> Result<Box<dyn MetadataStore>> {
        Ok(Box::new(SqliteMetadata::new(
            Rc::clone(&self.conn),
            schema,
            table,
            self.has_monotonic_id(),
        )))
    }

    fn load_statements(&self, body: &str, placeholders: &Placeholders) -> Result<Vec<SqlStatement>> {
        Ok(statements::load_statements(body, placeholders))
    }

    fn begin(&mut self) -> Result<()> {
        let conn = self.conn.borrow();
        conn.execute_batch("BEGIN")?;
        drop(conn);
        self.txn_open = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.conn.borrow();
        conn.execute_batch("COMMIT")?;
        drop(conn);
        self.txn_open = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let conn = self.conn.borrow();
        conn.execute_batch("ROLLBACK")?;
        drop(conn);
        self.txn_open = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.txn_open
    }

    fn execute(&mut self, sql: &str, timeout: Option<Duration>) -> Result<()> {
        let conn = self.conn.borrow();
        if let Some(timeout) = timeout {
            conn.busy_timeout(timeout)?;
        }
        conn.execute_batch(sql)?;
        Ok(())
    }
}
