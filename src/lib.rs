//! # Sqlevo - SQL schema migration engine
//!
//! A command-line tool and library that brings a database schema from its
//! current state to a declared target version by discovering SQL migration
//! scripts, reconciling them against a persisted history table, and applying
//! pending scripts in a strictly defined order.
//!
//! ## Features
//!
//! - **Versioned Migrations**: `V1__init.sql` style scripts applied once,
//!   in order, with checksum validation against the history
//! - **Repeatable Migrations**: `R__views.sql` scripts re-applied whenever
//!   their content changes
//! - **Cluster Safety**: application and metadata-table locks serialize
//!   concurrent runners on multi-instance deployments
//! - **Transaction Modes**: commit each script, commit everything at once,
//!   or roll the whole run back as a dry run
//! - **Five Commands**: migrate, validate, repair, erase, info
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqlevo::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
