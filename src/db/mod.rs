//! Database layer for the sqlevo engine.
//!
//! Everything that actually touches a database lives here, behind two
//! capability traits the engine core consumes: [`driver::Driver`] for
//! dialect-specific session operations and [`metadata::MetadataStore`] for
//! the persisted history table. The shipped implementation is SQLite on
//! `rusqlite`; other engines plug in by providing the same capabilities.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqlevo::db::sqlite::SqliteDriver;
//! use sqlevo::db::driver::Driver;
//! use std::path::Path;
//!
//! let driver = SqliteDriver::connect(Path::new("app.db"))?;
//! let metadata = driver.metadata_store("main", "changelog")?;
//! # anyhow::Ok(())
//! ```

/// Driver capability trait: schemas, locks, transactions, execution.
pub mod driver;

/// Metadata history table: entry model, store trait, SQLite implementation.
pub mod metadata;

/// SQLite driver implementation over a single shared connection.
pub mod sqlite;

/// Placeholder substitution and dialect-aware statement splitting.
pub mod statements;
