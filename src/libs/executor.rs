//! Application of a single migration script against a live session.
//!
//! The executor owns the statement loop for one script: split the body,
//! manage the transaction boundary around each statement, record the outcome
//! in the metadata history and keep the run counters current. Which scripts
//! run, and in what order, is the orchestrator's business.
//!
//! ## Transaction boundaries
//!
//! In commit-each mode every statement that tolerates transactions runs
//! inside one that the executor opens lazily and commits after the history
//! entry is written, so the script body and its history row land atomically.
//! Statements that refuse transactions (`VACUUM` and friends) force a commit
//! first. When an ambient transaction wraps the whole phase (commit-all /
//! rollback-all) the executor leaves transaction control entirely to the
//! orchestrator.

use crate::db::driver::Driver;
use crate::db::metadata::MetadataStore;
use crate::db::statements::Placeholders;
use crate::libs::error::EngineError;
use crate::libs::messages::Message;
use crate::libs::script::MigrationScript;
use crate::libs::summary::RunSummary;
use crate::{msg_debug, msg_success, msg_warning};
use anyhow::Result;
use std::time::{Duration, Instant};

pub struct Executor<'a> {
    pub driver: &'a mut dyn Driver,
    pub metadata: &'a mut dyn MetadataStore,
    pub placeholders: &'a Placeholders,
    pub command_timeout: Option<Duration>,
    /// True when an ambient transaction wraps the whole apply phase.
    pub ambient: bool,
    pub summary: &'a mut RunSummary,
}

impl Executor<'_> {
    /// Executes the script body and records a history entry.
    pub fn apply(&mut self, script: &MigrationScript) -> Result<()> {
        let started = Instant::now();
        let body = script.body()?;
        let statements = self.driver.load_statements(&body, self.placeholders)?;
        msg_debug!(format!("{}: {} statement(s)", script.name, statements.len()));

        for statement in &statements {
            if self.driver.supports_transactions() && !self.ambient {
                if statement.must_run_in_transaction && !self.driver.in_transaction() {
                    self.driver.begin()?;
                } else if !statement.must_run_in_transaction && self.driver.in_transaction() {
                    self.driver.commit()?;
                }
            }
            if let Err(cause) = self.driver.execute(&statement.sql, self.command_timeout) {
                return self.fail(script, started, cause);
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as i64;
        self.metadata.save_migration(script, true, elapsed_ms)?;
        if !self.ambient && self.driver.in_transaction() {
            self.driver.commit()?;
        }
        self.summary.nb_migration += 1;
        self.summary.applied_migrations.push(script.name.clone());
        msg_success!(Message::MigrationApplied(script.name.clone(), elapsed_ms));
        Ok(())
    }

    /// Records the script as applied without executing its body.
    pub fn mark_applied(&mut self, script: &MigrationScript) -> Result<()> {
        self.metadata.save_migration(script, true, 0)?;
        if !self.ambient && self.driver.in_transaction() {
            self.driver.commit()?;
        }
        self.summary.nb_migration += 1;
        self.summary.applied_migrations.push(script.name.clone());
        msg_success!(Message::MigrationMarkedApplied(script.name.clone()));
        Ok(())
    }

    /// Failure path: roll back the script's own transaction, persist the
    /// failed attempt (commit-each only; under an ambient transaction the
    /// entry could never survive the abort), and raise.
    fn fail(&mut self, script: &MigrationScript, started: Instant, cause: anyhow::Error) -> Result<()> {
        let elapsed_ms = started.elapsed().as_millis() as i64;
        if !self.ambient && self.driver.in_transaction() {
            if let Err(e) = self.driver.rollback() {
                msg_warning!(Message::RollbackFailed(script.name.clone(), e.to_string()));
            }
        }
        if !self.ambient {
            self.metadata.save_migration(script, false, elapsed_ms)?;
        }
        Err(EngineError::Execution {
            name: script.name.clone(),
            elapsed_ms,
            cause: cause.to_string(),
        }
        .into())
    }
}
