//! Typed error taxonomy for the migration engine.
//!
//! Errors are classified by effect, not by where they were raised: callers
//! (and tests) match on the variant to decide whether a failure was a
//! configuration mistake, a reconciliation inconsistency, or a script that
//! blew up mid-run. Everything propagates as `anyhow::Error` and can be
//! recovered with `downcast_ref::<EngineError>()`.

use thiserror::Error;

/// Fatal engine failures, classified by effect.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid or contradictory configuration, reported before any write.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reconciliation found inconsistencies between scripts and history.
    #[error("Validation failed:\n{0}")]
    Validation(String),

    /// A script failed while being applied.
    #[error("Migration {name} failed after {elapsed_ms} ms: {cause}")]
    Execution {
        name: String,
        elapsed_ms: i64,
        cause: String,
    },

    /// A cluster lock could not be acquired before the configured deadline.
    /// Contention itself is retried silently; only the deadline surfaces.
    #[error("Could not acquire the {lock} lock within {deadline_secs} s")]
    LockTimeout { lock: &'static str, deadline_secs: u64 },
}
