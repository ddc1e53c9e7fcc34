//! Per-command run counters.

use std::time::Duration;

/// What one command execution did, reset at command entry.
///
/// `applied_migrations` holds script names in application order; a
/// rollback-all run clears it again when the ambient transaction is aborted,
/// while `nb_migration` keeps counting what was executed.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub nb_migration: u32,
    pub nb_reparation: u32,
    pub nb_schema_erased: u32,
    pub nb_schema_to_erase_skipped: u32,
    pub total_time: Duration,
    pub applied_migrations: Vec<String>,
}

impl RunSummary {
    pub fn reset(&mut self) {
        *self = RunSummary::default();
    }
}
