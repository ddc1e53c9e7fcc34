//! Console rendering of the migration overview table.
//!
//! The Info command assembles [`InfoRow`]s (history entries, pending scripts,
//! ignored scripts, planned schema actions) and this module turns them into
//! one table for human inspection. Pure presentation; all classification
//! happens in the engine.

use crate::db::metadata::{MetadataEntry, MetadataType};
use crate::libs::formatter::format_timestamp;
use crate::libs::script::{MigrationScript, ScriptCategory};
use anyhow::Result;
use prettytable::{format, row, Table};

/// One row of the overview table, already formatted for display.
#[derive(Debug, Clone)]
pub struct InfoRow {
    /// History id, empty for rows not (yet) in the history.
    pub id: String,
    pub version: String,
    /// `V` for versioned, `R` for repeatable, empty for marks.
    pub category: String,
    pub description: String,
    pub installed_on: String,
    pub installed_by: String,
    /// `Success`, `Failed`, `Pending`, `Ignored` or `Lost`.
    pub state: String,
    pub checksum: String,
}

impl InfoRow {
    /// A schema action the next migrate would take.
    pub fn schema_action(schema: &str, action: &str) -> Self {
        Self {
            id: String::new(),
            version: "0".to_string(),
            category: String::new(),
            description: format!("{} {}", action, schema),
            installed_on: String::new(),
            installed_by: String::new(),
            state: "Pending".to_string(),
            checksum: String::new(),
        }
    }

    /// A persisted history entry.
    pub fn from_entry(entry: &MetadataEntry) -> Self {
        let category = match entry.kind {
            MetadataType::Migration => "V",
            MetadataType::RepeatableMigration => "R",
            _ => "",
        };
        let state = match entry.success {
            Some(true) => "Success",
            Some(false) => "Failed",
            None => "",
        };
        Self {
            id: entry.id.to_string(),
            version: entry.version.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            category: category.to_string(),
            description: entry.description.clone(),
            installed_on: format_timestamp(&entry.installed_on),
            installed_by: entry.installed_by.clone(),
            state: state.to_string(),
            checksum: entry.checksum.clone().unwrap_or_default(),
        }
    }

    /// A source script that has not run (pending, ignored or lost).
    pub fn from_script(script: &MigrationScript, state: &str) -> Self {
        let category = match script.category {
            ScriptCategory::Versioned => "V",
            ScriptCategory::Repeatable => "R",
        };
        Self {
            id: String::new(),
            version: script.version.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            category: category.to_string(),
            description: script.description.clone(),
            installed_on: String::new(),
            installed_by: String::new(),
            state: state.to_string(),
            checksum: String::new(),
        }
    }
}

/// A utility struct for rendering engine data to the console.
pub struct View {}

impl View {
    /// Displays the migration overview table.
    pub fn info(rows: &[InfoRow]) -> Result<()> {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row!["ID", "VERSION", "CATEGORY", "DESCRIPTION", "INSTALLED ON", "INSTALLED BY", "SUCCESS", "CHECKSUM"]);

        for info in rows {
            table.add_row(row![
                info.id,
                info.version,
                info.category,
                info.description,
                info.installed_on,
                info.installed_by,
                info.state,
                info.checksum
            ]);
        }

        table.printstd();
        Ok(())
    }
}
