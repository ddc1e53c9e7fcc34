//! Core library modules for the sqlevo engine.
//!
//! Everything database-agnostic lives here: the version model, script
//! discovery, reconciliation, execution, the command orchestrator and the
//! supporting infrastructure (configuration, messages, errors, rendering).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqlevo::libs::config::Config;
//! use sqlevo::libs::engine::Engine;
//!
//! let mut engine = Engine::new(Config::default())?;
//! engine.migrate()?;
//! # anyhow::Ok(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod loader;
pub mod messages;
pub mod reconciler;
pub mod script;
pub mod summary;
pub mod version;
pub mod view;
