//! Migration orchestrator: the state machine behind every command.
//!
//! The [`Engine`] drives the five user-facing commands (migrate, validate,
//! repair, erase, info) as guarded sequences over the loader, the driver and
//! the metadata store. All commands share one envelope:
//!
//! ```text
//! reset counters → (cluster) application lock → ensure schemas
//!   → (cluster) metadata lock → command body
//!   → release metadata lock → release application lock
//! ```
//!
//! Info and validate are read-only: they take no locks and never create
//! schemas or the metadata table, so they cannot perturb concurrent runners.
//!
//! ## Locking
//!
//! Cluster mode (on by default) serializes concurrent runners with two nested
//! locks: the driver's application lock, then a lock row in the metadata
//! table. Contention is retried with exponential backoff up to a ceiling,
//! bounded by an overall deadline; release is attempted on every exit path
//! and a release failure is logged without masking the primary error.
//!
//! ## Transaction modes
//!
//! In commit-each mode every script commits on its own and a failure leaves a
//! `success = false` history entry behind. In commit-all and rollback-all an
//! ambient transaction wraps the whole apply phase; nothing is persisted
//! unless the run completes (commit-all); rollback-all always aborts and
//! reports every executed script as rolled back.

use crate::db::driver::Driver;
use crate::db::metadata::{MetadataEntry, MetadataStore, MetadataType};
use crate::db::sqlite::SqliteDriver;
use crate::libs::config::{Config, TransactionMode};
use crate::libs::error::EngineError;
use crate::libs::executor::Executor;
use crate::libs::loader::{EmbeddedLoader, FileLoader, MigrationLoader};
use crate::libs::messages::Message;
use crate::libs::reconciler::{reconcile, Reconciliation};
use crate::libs::script::MigrationScript;
use crate::libs::summary::RunSummary;
use crate::libs::version::Version;
use crate::libs::view::{InfoRow, View};
use crate::{msg_debug, msg_info, msg_success, msg_warning};
use anyhow::Result;
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

/// How the shared validate-and-repair walk treats checksum drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    /// Raise a validation error naming the script.
    Raise,
    /// Overwrite the stored checksum and count the reparation.
    Fix,
}

pub struct Engine {
    config: Config,
    driver: Box<dyn Driver>,
    loader: Box<dyn MigrationLoader>,
    metadata: Box<dyn MetadataStore>,
    /// Managed schemas in discovery order; erase walks them in reverse.
    schemas: Vec<String>,
    summary: RunSummary,
}

impl Engine {
    /// Builds an engine over the configured SQLite database and the file
    /// loader scanning the configured locations.
    pub fn new(config: Config) -> Result<Self> {
        let driver = Box::new(SqliteDriver::connect(&config.database_path()?)?);
        let loader = Box::new(FileLoader::new(config.locations.clone(), &config.naming(), config.script_encoding()?)?);
        Self::assemble(config, driver, loader)
    }

    /// Builds an engine serving scripts embedded in the calling binary.
    ///
    /// The loader is bound here, once: embedded sources win over the file
    /// locations for the lifetime of the engine.
    pub fn with_embedded(config: Config, sources: Vec<(String, Vec<u8>)>) -> Result<Self> {
        let driver = Box::new(SqliteDriver::connect(&config.database_path()?)?);
        let loader = Box::new(EmbeddedLoader::new(sources, &config.naming(), config.script_encoding()?)?);
        Self::assemble(config, driver, loader)
    }

    /// Builds an engine over caller-supplied driver and loader. This is the
    /// seam other database drivers (and tests) plug into.
    pub fn with_parts(config: Config, driver: Box<dyn Driver>, loader: Box<dyn MigrationLoader>) -> Result<Self> {
        Self::assemble(config, driver, loader)
    }

    fn assemble(config: Config, driver: Box<dyn Driver>, loader: Box<dyn MigrationLoader>) -> Result<Self> {
        let schemas = if config.schemas.is_empty() {
            vec![driver.current_schema()?]
        } else {
            config.schemas.clone()
        };
        let metadata_schema = config.metadata_table_schema.clone().unwrap_or_else(|| schemas[0].clone());
        let metadata = driver.metadata_store(&metadata_schema, &config.metadata_table_name)?;
        Ok(Self {
            config,
            driver,
            loader,
            metadata,
            schemas,
            summary: RunSummary::default(),
        })
    }

    /// Counters of the most recent command execution.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    // === Commands ===

    /// Brings the database to the target version.
    pub fn migrate(&mut self) -> Result<()> {
        self.run_guarded(|engine| engine.migrate_body())
    }

    /// Read-only consistency check between scripts and history.
    pub fn validate(&mut self) -> Result<()> {
        self.summary.reset();
        let started = Instant::now();
        let result = self.validate_body();
        self.summary.total_time = started.elapsed();
        result
    }

    /// Overwrites drifted checksums in the history; applies nothing.
    pub fn repair(&mut self) -> Result<()> {
        self.run_guarded(|engine| engine.repair_body())
    }

    /// Drops or empties every managed schema the engine is allowed to.
    pub fn erase(&mut self) -> Result<()> {
        self.run_guarded(|engine| engine.erase_body())
    }

    /// Renders the tabular overview and returns its rows.
    pub fn info(&mut self) -> Result<Vec<InfoRow>> {
        self.summary.reset();
        let started = Instant::now();
        let rows = self.info_rows()?;
        View::info(&rows)?;
        self.summary.total_time = started.elapsed();
        Ok(rows)
    }

    // === Shared envelope ===

    /// Runs a writing command body inside the lock envelope.
    fn run_guarded(&mut self, body: fn(&mut Engine) -> Result<()>) -> Result<()> {
        self.summary.reset();
        let started = Instant::now();
        let cluster = self.config.enable_cluster_mode;

        if cluster {
            self.wait_for_lock("application", |engine| engine.driver.try_acquire_application_lock())?;
        }

        let mut metadata_locked = false;
        let mut result = self.ensure_schemas();
        if result.is_ok() && cluster {
            result = self.wait_for_lock("metadata", |engine| engine.metadata.try_lock());
            metadata_locked = result.is_ok();
        }
        if result.is_ok() {
            result = body(self);
        }

        // Locks are released on every exit path; a failed release is logged
        // and never masks the primary error.
        if metadata_locked {
            if let Err(e) = self.metadata.release_lock() {
                msg_warning!(Message::LockReleaseFailed("metadata".to_string(), e.to_string()));
            }
        }
        if cluster {
            if let Err(e) = self.driver.release_application_lock() {
                msg_warning!(Message::LockReleaseFailed("application".to_string(), e.to_string()));
            }
        }

        self.summary.total_time = started.elapsed();
        result
    }

    /// Spins on a lock with exponential backoff up to the ceiling, bounded
    /// by the overall deadline. Contention is never surfaced, only logged.
    fn wait_for_lock(&mut self, lock: &'static str, mut attempt: impl FnMut(&mut Engine) -> Result<bool>) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(self.config.lock_timeout_secs);
        let mut delay = Duration::from_millis(self.config.lock_retry_initial_ms.max(1));
        let ceiling = Duration::from_millis(self.config.lock_retry_ceiling_ms.max(1));
        loop {
            if attempt(self)? {
                return Ok(());
            }
            if Instant::now() + delay >= deadline {
                return Err(EngineError::LockTimeout {
                    lock,
                    deadline_secs: self.config.lock_timeout_secs,
                }
                .into());
            }
            msg_info!(Message::LockContended(lock.to_string(), delay.as_millis() as u64));
            thread::sleep(delay);
            delay = (delay * 2).min(ceiling);
        }
    }

    /// Creates missing schemas, the metadata table, and the adoption marks.
    ///
    /// Emptiness is checked before the metadata table is created so a fresh
    /// schema is adopted as empty (and stays erasable) even though the
    /// history table lands in it a moment later.
    fn ensure_schemas(&mut self) -> Result<()> {
        let mut created = Vec::new();
        let mut adopted_empty = Vec::new();
        for schema in self.schemas.clone() {
            if !self.driver.schema_exists(&schema)? {
                self.driver.create_schema(&schema)?;
                msg_info!(Message::SchemaCreated(schema.clone()));
                created.push(schema);
            } else if self.driver.schema_is_empty(&schema)? {
                adopted_empty.push(schema);
            }
        }
        self.metadata.create_if_not_exists()?;
        let zero = Version::parse("0")?;
        for schema in created {
            self.metadata.save(MetadataType::NewSchema, Some(&zero), &format!("create schema {}", schema), &schema)?;
        }
        for schema in adopted_empty {
            if !self.metadata.empty_schema_marked(&schema)? {
                self.metadata.save(MetadataType::EmptySchema, Some(&zero), &format!("empty schema {} adopted", schema), &schema)?;
                msg_debug!(format!("Schema '{}' adopted while empty", schema));
            }
        }
        Ok(())
    }

    // === Migrate ===

    fn migrate_body(&mut self) -> Result<()> {
        self.check_start_version()?;

        if let Err(e) = self.validate_and_repair(WalkMode::Raise) {
            let is_validation = e.downcast_ref::<EngineError>().map(|e| matches!(e, EngineError::Validation(_))).unwrap_or(false);
            if is_validation && self.config.must_erase_on_validation_error {
                msg_warning!(Message::EraseOnValidationError(e.to_string()));
                self.erase_schemas()?;
                self.ensure_schemas()?;
                self.check_start_version()?;
            } else {
                return Err(e);
            }
        }

        let versioned = self.loader.versioned_scripts()?;
        let repeatable = self.loader.repeatable_scripts()?;
        check_cross_category_names(&versioned, &repeatable)?;
        if versioned.is_empty() && repeatable.is_empty() {
            msg_info!(Message::NoMigrationScripts);
            return Ok(());
        }

        let recon = self.reconcile(&versioned, &repeatable)?;
        // Version a dry run would reach; advisory only, nothing persists it.
        let reached = recon
            .pending_forward
            .last()
            .and_then(|s| s.version.clone())
            .unwrap_or_else(|| recon.last_applied_version.clone());

        // Ambient modes need real transactions; drivers without them apply
        // script by script.
        let mode = if self.driver.supports_transactions() {
            self.config.transaction_mode
        } else {
            TransactionMode::CommitEach
        };
        match mode {
            TransactionMode::CommitEach => self.apply_phase(&recon, mode)?,
            TransactionMode::CommitAll => {
                self.driver.begin()?;
                match self.apply_phase(&recon, mode) {
                    Ok(()) => self.driver.commit()?,
                    Err(e) => {
                        self.abort_ambient();
                        return Err(e);
                    }
                }
            }
            TransactionMode::RollbackAll => {
                self.driver.begin()?;
                let result = self.apply_phase(&recon, mode);
                self.abort_ambient();
                msg_info!(Message::RollbackAllComplete(reached.to_string()));
                result?;
            }
        }

        msg_success!(Message::MigrateComplete(self.summary.nb_migration));
        Ok(())
    }

    /// Rolls back the ambient transaction and reports every script executed
    /// in this run as rolled back, clearing the applied list.
    fn abort_ambient(&mut self) {
        if let Err(e) = self.driver.rollback() {
            msg_warning!(Message::LockReleaseFailed("transaction".to_string(), e.to_string()));
        }
        for name in std::mem::take(&mut self.summary.applied_migrations) {
            msg_warning!(Message::MigrationRolledBack(name));
        }
    }

    /// Applies out-of-order gaps, then forward pendings, then repeatables.
    fn apply_phase(&mut self, recon: &Reconciliation, mode: TransactionMode) -> Result<()> {
        let ambient = mode != TransactionMode::CommitEach;
        let out_of_order = self.config.out_of_order;
        let skip_next = self.config.skip_next_migrations;
        let retry_repeatable = self.config.retry_repeatable_migrations_until_no_error;
        let placeholders = self.config.placeholder_settings();
        let command_timeout = self.config.command_timeout_secs.map(Duration::from_secs);

        let mut executor = Executor {
            driver: &mut *self.driver,
            metadata: &mut *self.metadata,
            placeholders: &placeholders,
            command_timeout,
            ambient,
            summary: &mut self.summary,
        };

        if out_of_order {
            for script in &recon.out_of_order_pending {
                executor.apply(script)?;
            }
        }

        for script in &recon.pending_forward {
            if skip_next {
                executor.mark_applied(script)?;
            } else {
                executor.apply(script)?;
            }
        }

        if retry_repeatable {
            apply_repeatable_with_retry(&mut executor, &recon.pending_repeatable)?;
        } else {
            for script in &recon.pending_repeatable {
                executor.apply(script)?;
            }
        }
        Ok(())
    }

    /// Guards the start-version option and persists the one-time marker.
    ///
    /// Once migrations exist, or a marker was persisted, the option can no
    /// longer change; that is a configuration error caught before any write.
    fn check_start_version(&mut self) -> Result<()> {
        let configured = self.config.start_version()?;
        match self.metadata.start_version()? {
            Some(persisted) => {
                if configured != Version::Min && configured != persisted {
                    return Err(EngineError::Configuration(format!(
                        "start version is already set to {} and cannot change to {}",
                        persisted, configured
                    ))
                    .into());
                }
            }
            None if configured != Version::Min => {
                if self.metadata.is_initialized()? {
                    return Err(EngineError::Configuration(format!(
                        "start version {} cannot be introduced after migrations were applied",
                        configured
                    ))
                    .into());
                }
                self.metadata
                    .save(MetadataType::StartVersion, Some(&configured), "start version", &configured.to_string())?;
                msg_info!(Message::StartVersionPersisted(configured.to_string()));
            }
            None => {}
        }
        Ok(())
    }

    // === Validate ===

    fn validate_body(&mut self) -> Result<()> {
        let versioned = self.loader.versioned_scripts()?;
        let repeatable = self.loader.repeatable_scripts()?;
        check_cross_category_names(&versioned, &repeatable)?;
        let recon = self.reconcile(&versioned, &repeatable)?;
        let applied = self.applied_snapshot()?;

        let mut problems = Vec::new();
        for entry in &applied {
            match versioned.iter().find(|s| s.name == entry.name) {
                None => problems.push(format!("missing script for applied migration: {}", entry.name)),
                Some(script) => {
                    if entry.checksum.as_deref() != Some(script.checksum()?.as_str()) {
                        problems.push(format!("invalid checksum for: {}", script.name));
                    }
                }
            }
        }
        for script in &recon.out_of_order_pending {
            problems.push(format!("pending migration: {}", script.name));
        }
        for script in &recon.pending_forward {
            problems.push(format!("pending migration: {}", script.name));
        }
        // Repeat-always scripts are pending on every run; listing them would
        // make validate permanently fail.
        for script in recon.pending_repeatable.iter().filter(|s| !s.must_repeat_always) {
            problems.push(format!("pending repeatable migration: {}", script.name));
        }

        if !problems.is_empty() {
            return Err(EngineError::Validation(problems.join("\n")).into());
        }
        msg_success!(Message::ValidateOk);
        Ok(())
    }

    // === Repair ===

    fn repair_body(&mut self) -> Result<()> {
        self.validate_and_repair(WalkMode::Fix)?;
        msg_success!(Message::RepairComplete(self.summary.nb_reparation));
        Ok(())
    }

    /// Walk over the scripts in `[effective start, last applied]`, used by
    /// both the migrate preamble and the repair command: raises on drift in
    /// [`WalkMode::Raise`], overwrites the stored checksum in
    /// [`WalkMode::Fix`]. Returns silently when nothing was ever applied.
    fn validate_and_repair(&mut self, mode: WalkMode) -> Result<()> {
        if !self.metadata.table_exists()? || !self.metadata.is_initialized()? {
            return Ok(());
        }
        let versioned = self.loader.versioned_scripts()?;
        let applied = self.metadata.applied_migrations()?;
        let configured_start = self.config.start_version()?;
        let start = self.metadata.start_version()?.unwrap_or(configured_start);
        let last = self.metadata.last_applied_version()?;

        for script in &versioned {
            let version = script.version.as_ref().expect("versioned script without version");
            if *version < start || *version > last {
                continue;
            }
            match applied.iter().find(|e| e.version.as_ref() == Some(version)) {
                None => {
                    if self.config.out_of_order {
                        // The out-of-order phase will pick this one up.
                        continue;
                    }
                    return Err(EngineError::Validation(format!(
                        "pending migration behind the last applied version: {} (enable out_of_order to apply it)",
                        script.name
                    ))
                    .into());
                }
                Some(entry) => {
                    let current = script.checksum()?;
                    if entry.checksum.as_deref() != Some(current.as_str()) {
                        match mode {
                            WalkMode::Fix => {
                                self.metadata.update_checksum(entry.id, &current)?;
                                self.summary.nb_reparation += 1;
                                msg_info!(Message::ChecksumRepaired(script.name.clone()));
                            }
                            WalkMode::Raise => {
                                return Err(EngineError::Validation(format!("invalid checksum for: {}", script.name)).into());
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // === Erase ===

    fn erase_body(&mut self) -> Result<()> {
        self.erase_schemas()?;
        msg_success!(Message::EraseComplete(self.summary.nb_schema_erased, self.summary.nb_schema_to_erase_skipped));
        Ok(())
    }

    /// Drops engine-created schemas, erases adopted-empty ones, skips the
    /// rest. Walks schemas in reverse discovery order so the schema holding
    /// the metadata table goes last.
    fn erase_schemas(&mut self) -> Result<()> {
        if self.config.is_erase_disabled {
            return Err(EngineError::Configuration("erase is disabled (is_erase_disabled = true)".to_string()).into());
        }
        for schema in self.schemas.clone().into_iter().rev() {
            if self.metadata.can_drop_schema(&schema)? {
                self.driver.drop_schema(&schema)?;
                self.summary.nb_schema_erased += 1;
                msg_success!(Message::SchemaDropped(schema));
            } else if self.metadata.can_erase_schema(&schema)? {
                self.driver.erase_schema(&schema)?;
                self.summary.nb_schema_erased += 1;
                msg_success!(Message::SchemaErased(schema));
            } else {
                self.summary.nb_schema_to_erase_skipped += 1;
                msg_warning!(Message::SchemaEraseSkipped(schema));
            }
        }
        Ok(())
    }

    // === Info ===

    /// Assembles the nine row groups of the overview, top to bottom:
    /// pending schema actions, pre-migration history, ignored-before-start,
    /// executed history, out-of-order pendings (or the advisory "Lost" rows
    /// when out-of-order application is off), forward pendings, repeatable
    /// pendings, off-target scripts.
    fn info_rows(&mut self) -> Result<Vec<InfoRow>> {
        let versioned = self.loader.versioned_scripts()?;
        let repeatable = self.loader.repeatable_scripts()?;
        let recon = self.reconcile(&versioned, &repeatable)?;
        let table_exists = self.metadata.table_exists()?;
        let entries = if table_exists { self.metadata.all_entries()? } else { Vec::new() };

        let mut rows = Vec::new();

        // 1. Schema actions the next migrate would take.
        for schema in self.schemas.clone() {
            if !self.driver.schema_exists(&schema)? {
                rows.push(InfoRow::schema_action(&schema, "create schema"));
            } else if self.driver.schema_is_empty(&schema)? && !(table_exists && self.metadata.empty_schema_marked(&schema)?) {
                rows.push(InfoRow::schema_action(&schema, "mark schema empty"));
            }
        }

        // 2. History entries preceding the first migration, by (version, installed_on).
        let first_migration = entries
            .iter()
            .position(|e| matches!(e.kind, MetadataType::Migration | MetadataType::RepeatableMigration))
            .unwrap_or(entries.len());
        let mut preamble: Vec<&MetadataEntry> = entries[..first_migration].iter().collect();
        preamble.sort_by(|a, b| (&a.version, a.installed_on).cmp(&(&b.version, b.installed_on)));
        rows.extend(preamble.into_iter().map(InfoRow::from_entry));

        // 3. Scripts below the start version.
        rows.extend(recon.ignored_before_start.iter().map(|s| InfoRow::from_script(s, "Ignored")));

        // 4. Executed migrations in history order.
        rows.extend(
            entries
                .iter()
                .filter(|e| matches!(e.kind, MetadataType::Migration | MetadataType::RepeatableMigration))
                .map(InfoRow::from_entry),
        );

        // 5./6. Gap scripts: pending when out-of-order is on, lost otherwise.
        let gap_state = if self.config.out_of_order { "Pending" } else { "Lost" };
        rows.extend(recon.out_of_order_pending.iter().map(|s| InfoRow::from_script(s, gap_state)));

        // 7./8. Forward and repeatable pendings.
        rows.extend(recon.pending_forward.iter().map(|s| InfoRow::from_script(s, "Pending")));
        rows.extend(recon.pending_repeatable.iter().map(|s| InfoRow::from_script(s, "Pending")));

        // 9. Scripts above the target version.
        rows.extend(recon.off_target.iter().map(|s| InfoRow::from_script(s, "Ignored")));

        Ok(rows)
    }

    // === Snapshot helpers ===

    /// Successful versioned history entries, empty when no table exists yet.
    fn applied_snapshot(&self) -> Result<Vec<MetadataEntry>> {
        if self.metadata.table_exists()? {
            self.metadata.applied_migrations()
        } else {
            Ok(Vec::new())
        }
    }

    fn reconcile(&self, versioned: &[MigrationScript], repeatable: &[MigrationScript]) -> Result<Reconciliation> {
        let table_exists = self.metadata.table_exists()?;
        let (applied, applied_repeatable, persisted_start) = if table_exists {
            (
                self.metadata.applied_migrations()?,
                self.metadata.applied_repeatable_migrations()?,
                self.metadata.start_version()?,
            )
        } else {
            (Vec::new(), Vec::new(), None)
        };
        reconcile(
            versioned,
            repeatable,
            &applied,
            &applied_repeatable,
            persisted_start.as_ref(),
            &self.config.start_version()?,
            &self.config.target_version()?,
        )
    }
}

/// Applies the pending repeatable list until it drains or stops making
/// progress. Failures are recorded and retried; when scripts remain
/// unexecuted after the loop, the first error of the final round is raised.
fn apply_repeatable_with_retry(executor: &mut Executor<'_>, pending: &[MigrationScript]) -> Result<()> {
    let mut remaining: Vec<&MigrationScript> = pending.iter().collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        let mut failed = Vec::new();
        let mut errors = Vec::new();
        for script in remaining {
            if let Err(e) = executor.apply(script) {
                msg_warning!(Message::RepeatableFailedWillRetry(script.name.clone(), e.to_string()));
                failed.push(script);
                errors.push(e);
            }
        }
        if failed.len() == before {
            // No script succeeded this round: the set cannot shrink further.
            return Err(errors
                .into_iter()
                .next()
                .expect("a round without progress records at least one error"));
        }
        remaining = failed;
    }
    Ok(())
}

/// Rejects a name used by both a versioned and a repeatable script.
fn check_cross_category_names(versioned: &[MigrationScript], repeatable: &[MigrationScript]) -> Result<()> {
    let versioned_names: HashSet<&str> = versioned.iter().map(|s| s.name.as_str()).collect();
    for script in repeatable {
        if versioned_names.contains(script.name.as_str()) {
            return Err(EngineError::Configuration(format!("script name used by two categories: {}", script.name)).into());
        }
    }
    Ok(())
}
