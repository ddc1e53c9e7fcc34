//! Reconciliation between source scripts and the persisted history.
//!
//! A pure computation: given the scripts on disk, a snapshot of the metadata
//! history and the configured version window, it classifies every versioned
//! script into exactly one of four disjoint sets and decides which repeatable
//! scripts need re-application. Nothing here touches the database or decides
//! what to do with the sets; that is the orchestrator's job.
//!
//! ## Versioned classification
//!
//! With `start` the effective start version, `target` the target version and
//! `last` the last applied version:
//!
//! - `version < start` → ignored (intentionally skipped forever)
//! - `version > target` → off-target (ignored until the target moves)
//! - `last < version ≤ target` → pending, applied in ascending order
//! - `start ≤ version ≤ last` with no successful history entry → an
//!   out-of-order gap. Whether gaps are applied or fail validation is the
//!   caller's decision; the set itself is always computed so the Info command
//!   can show gaps even when out-of-order application is disabled.
//!
//! ## Repeatable classification
//!
//! A repeatable script is pending when it has never run, when it demands
//! re-application on every run, or when the checksum of its most recent
//! successful entry (by `installed_on`) differs from the current body.

use crate::db::metadata::MetadataEntry;
use crate::libs::script::MigrationScript;
use crate::libs::version::Version;
use anyhow::Result;

/// Outcome of reconciling scripts against the history snapshot.
#[derive(Debug)]
pub struct Reconciliation {
    /// Versioned scripts below the effective start version.
    pub ignored_before_start: Vec<MigrationScript>,
    /// Versioned scripts to apply forward, ascending by version.
    pub pending_forward: Vec<MigrationScript>,
    /// In-window versioned scripts with no successful history entry.
    pub out_of_order_pending: Vec<MigrationScript>,
    /// Versioned scripts above the target version.
    pub off_target: Vec<MigrationScript>,
    /// Repeatable scripts that need (re-)application, enumeration order.
    pub pending_repeatable: Vec<MigrationScript>,
    pub effective_start_version: Version,
    pub last_applied_version: Version,
}

/// Classifies every script against the history snapshot.
///
/// `versioned` must be sorted ascending by version (the loader guarantees
/// this); `applied` and `applied_repeatable` are the successful history
/// entries of each category.
pub fn reconcile(
    versioned: &[MigrationScript],
    repeatable: &[MigrationScript],
    applied: &[MetadataEntry],
    applied_repeatable: &[MetadataEntry],
    persisted_start_version: Option<&Version>,
    configured_start_version: &Version,
    target_version: &Version,
) -> Result<Reconciliation> {
    let effective_start_version = persisted_start_version.unwrap_or(configured_start_version).clone();
    let last_applied_version = applied.iter().filter_map(|e| e.version.clone()).max().unwrap_or(Version::Min);

    let mut ignored_before_start = Vec::new();
    let mut pending_forward = Vec::new();
    let mut out_of_order_pending = Vec::new();
    let mut off_target = Vec::new();

    for script in versioned {
        let version = script.version.as_ref().expect("versioned script without version");
        if *version < effective_start_version {
            ignored_before_start.push(script.clone());
        } else if *version > *target_version {
            off_target.push(script.clone());
        } else if *version > last_applied_version {
            pending_forward.push(script.clone());
        } else if !applied.iter().any(|e| e.version.as_ref() == Some(version)) {
            out_of_order_pending.push(script.clone());
        }
    }

    let mut pending_repeatable = Vec::new();
    for script in repeatable {
        if is_repeatable_pending(script, applied_repeatable)? {
            pending_repeatable.push(script.clone());
        }
    }

    Ok(Reconciliation {
        ignored_before_start,
        pending_forward,
        out_of_order_pending,
        off_target,
        pending_repeatable,
        effective_start_version,
        last_applied_version,
    })
}

/// Decides whether one repeatable script needs to run.
pub fn is_repeatable_pending(script: &MigrationScript, applied_repeatable: &[MetadataEntry]) -> Result<bool> {
    // Most recent entry for this name; `>=` keeps the later row on equal
    // timestamps, matching history order.
    let mut latest: Option<&MetadataEntry> = None;
    for entry in applied_repeatable.iter().filter(|e| e.name == script.name) {
        if latest.map(|l| entry.installed_on >= l.installed_on).unwrap_or(true) {
            latest = Some(entry);
        }
    }
    let Some(latest) = latest else {
        return Ok(true);
    };
    if script.must_repeat_always {
        return Ok(true);
    }
    Ok(latest.checksum.as_deref() != Some(script.checksum()?.as_str()))
}
