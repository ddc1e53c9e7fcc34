//! Display implementation for engine messages.
//!
//! Converts [`Message`] variants into the human-readable text shown on the
//! console (or routed through tracing in debug mode). Keeping every string
//! here gives one place to review tone and wording across the whole tool.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let message = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigFileNotFound(path) => format!("Configuration file not found: {}", path),
            Message::ConfigParseError(path, e) => format!("Failed to parse configuration file {}: {}", path, e),
            Message::DatabaseNotConfigured => format!("No database configured. Set \"database\" in sqlevo.json, pass --database, or export {}", crate::libs::config::DATABASE_ENV_VAR),
            Message::UnknownEncoding(label) => format!("Unknown script encoding: {}", label),
            Message::InvalidTransactionMode(value) => format!("Invalid transaction mode '{}', expected commit-each, commit-all or rollback-all", value),
            Message::InvalidVersionLabel(label) => format!("Invalid version '{}', expected dot-separated numbers like 1.2.3", label),
            Message::InvalidPlaceholder(raw) => format!("Invalid placeholder '{}', expected key=value", raw),

            // === SCRIPT MESSAGES ===
            Message::ScriptReadFailed(name, e) => format!("Failed to read migration script {}: {}", name, e),
            Message::ScriptDecodeFailed(name, encoding) => format!("Migration script {} is not valid {}", name, encoding),
            Message::ScriptsLocationUnreadable(location, e) => format!("Cannot read scripts location {}: {}", location, e),
            Message::ScriptNameUnrecognized(name) => format!("Embedded script name does not follow the naming convention: {}", name),
            Message::DuplicateVersion(version, first, second) => format!("Found two migration scripts with version {}: {} and {}", version, first, second),
            Message::DuplicateScriptName(name) => format!("Found two migration scripts named {}", name),

            // === SCHEMA MESSAGES ===
            Message::SchemaCreated(schema) => format!("Created schema {}", schema),
            Message::SchemaCreateUnsupported(schema) => format!("Schema {} does not exist and cannot be created on this database", schema),
            Message::SchemaDropped(schema) => format!("Dropped schema {}", schema),
            Message::SchemaErased(schema) => format!("Erased schema {}", schema),
            Message::SchemaEraseSkipped(schema) => format!("Schema {} was not created by this tool and was not adopted empty; skipping", schema),

            // === MIGRATE MESSAGES ===
            Message::NoMigrationScripts => "No migration scripts found, nothing to do".to_string(),
            Message::MigrationApplied(name, elapsed_ms) => format!("Applied {} ({} ms)", name, elapsed_ms),
            Message::MigrationMarkedApplied(name) => format!("Marked {} as applied without executing it", name),
            Message::MigrationRolledBack(name) => format!("Rolled back {}", name),
            Message::RollbackFailed(name, e) => format!("Failed to roll back after {}: {}", name, e),
            Message::RollbackAllComplete(version) => format!("Rollback-all run finished; the database stays unchanged (dry-run reached version {})", version),
            Message::RepeatableFailedWillRetry(name, e) => format!("Repeatable migration {} failed, will retry: {}", name, e),
            Message::StartVersionPersisted(version) => format!("Recorded start version {}; lower versions stay ignored", version),
            Message::MigrateComplete(count) => format!("Database migrated, {} migration(s) applied", count),
            Message::EraseOnValidationError(e) => format!("Validation failed and erase-on-validation-error is enabled; erasing and re-applying everything. Cause: {}", e),

            // === VALIDATE / REPAIR MESSAGES ===
            Message::ValidateOk => "Validation succeeded, scripts and history are consistent".to_string(),
            Message::ChecksumRepaired(name) => format!("Updated stored checksum of {}", name),
            Message::RepairComplete(count) => format!("Repair finished, {} checksum(s) updated", count),

            // === ERASE MESSAGES ===
            Message::ConfirmErase(database) => format!("Erase all managed schemas of {}? This cannot be undone", database),
            Message::EraseCancelled => "Erase cancelled".to_string(),
            Message::EraseComplete(erased, skipped) => format!("Erase finished: {} schema(s) erased, {} skipped", erased, skipped),

            // === LOCK MESSAGES ===
            Message::LockContended(lock, wait_ms) => format!("The {} lock is held by another runner, retrying in {} ms", lock, wait_ms),
            Message::LockReleaseFailed(lock, e) => format!("Failed to release the {} lock: {}", lock, e),

            // === METADATA MESSAGES ===
            Message::MetadataCorrupted(detail) => format!("Metadata table is corrupted: {}", detail),

            // === GENERAL MESSAGES ===
            Message::RunDuration(elapsed) => format!("Finished in {}", elapsed),
        };
        write!(f, "{}", message)
    }
}
