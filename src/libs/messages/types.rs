//! Message type definitions for all user-facing output.
//!
//! Every string the engine shows a user lives here as an enum variant, so
//! call sites stay typo-free and the full vocabulary of the tool is visible
//! in one place. Formatting happens in the `Display` implementation.

/// All user-facing messages with their typed parameters.
#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigFileNotFound(String),        // path
    ConfigParseError(String, String),  // path, error
    DatabaseNotConfigured,
    UnknownEncoding(String),           // label
    InvalidTransactionMode(String),    // value
    InvalidVersionLabel(String),       // label
    InvalidPlaceholder(String),        // raw argument

    // === SCRIPT MESSAGES ===
    ScriptReadFailed(String, String),          // name, error
    ScriptDecodeFailed(String, String),        // name, encoding
    ScriptsLocationUnreadable(String, String), // location, error
    ScriptNameUnrecognized(String),            // name
    DuplicateVersion(String, String, String),  // version, first, second
    DuplicateScriptName(String),               // name

    // === SCHEMA MESSAGES ===
    SchemaCreated(String),           // schema
    SchemaCreateUnsupported(String), // schema
    SchemaDropped(String),           // schema
    SchemaErased(String),            // schema
    SchemaEraseSkipped(String),      // schema

    // === MIGRATE MESSAGES ===
    NoMigrationScripts,
    MigrationApplied(String, i64),          // name, elapsed ms
    MigrationMarkedApplied(String),         // name
    MigrationRolledBack(String),            // name
    RollbackFailed(String, String),         // name, error
    RollbackAllComplete(String),            // advisory last applied version
    RepeatableFailedWillRetry(String, String), // name, error
    StartVersionPersisted(String),          // version
    MigrateComplete(u32),                   // applied count
    EraseOnValidationError(String),         // validation error text

    // === VALIDATE / REPAIR MESSAGES ===
    ValidateOk,
    ChecksumRepaired(String), // name
    RepairComplete(u32),      // repaired count

    // === ERASE MESSAGES ===
    ConfirmErase(String),   // database
    EraseCancelled,
    EraseComplete(u32, u32), // erased, skipped

    // === LOCK MESSAGES ===
    LockContended(String, u64),       // lock, next wait ms
    LockReleaseFailed(String, String), // lock, error

    // === METADATA MESSAGES ===
    MetadataCorrupted(String), // detail

    // === GENERAL MESSAGES ===
    RunDuration(String), // formatted elapsed
}
