//! Migration script discovery from the filesystem or embedded sources.
//!
//! Provides the [`MigrationLoader`] capability the engine consumes, plus the
//! two shipped implementations:
//!
//! - [`FileLoader`] walks the configured locations recursively and picks up
//!   every file matching the naming convention.
//! - [`EmbeddedLoader`] serves scripts compiled into the calling binary
//!   (e.g. via `include_bytes!`), for deployments that ship no script files.
//!
//! ## Naming convention
//!
//! With the default options a versioned script is named
//! `V<version>__<description>.sql` and a repeatable script
//! `R__<description>.sql`. Every piece (prefixes, separator, suffix) is
//! configurable. A repeatable description stem ending in `!` marks the script
//! as repeat-always: it re-runs on every migration regardless of checksum,
//! and the marker is stripped from the display description.
//!
//! ## Invariants enforced here
//!
//! Versioned scripts must have unique versions, repeatable scripts unique
//! names, and names must not collide across categories. Violations are
//! configuration errors raised before anything touches the database.

use crate::libs::messages::Message;
use crate::libs::script::{MigrationScript, ScriptCategory};
use crate::libs::version::Version;
use crate::msg_debug;
use crate::msg_error_anyhow;
use anyhow::Result;
use encoding_rs::Encoding;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Naming options for migration files.
#[derive(Debug, Clone)]
pub struct ScriptNaming {
    /// Prefix of versioned scripts, `V` by default.
    pub migration_prefix: String,
    /// Prefix of repeatable scripts, `R` by default.
    pub repeatable_prefix: String,
    /// Separator between prefix/version and description, `__` by default.
    pub separator: String,
    /// File suffix, `.sql` by default.
    pub suffix: String,
}

impl Default for ScriptNaming {
    fn default() -> Self {
        Self {
            migration_prefix: "V".to_string(),
            repeatable_prefix: "R".to_string(),
            separator: "__".to_string(),
            suffix: ".sql".to_string(),
        }
    }
}

/// Marker on a repeatable description stem requesting re-application on
/// every run.
const REPEAT_ALWAYS_MARKER: char = '!';

/// A parsed script file name.
#[derive(Debug)]
struct ParsedName {
    category: ScriptCategory,
    version: Option<Version>,
    description: String,
    must_repeat_always: bool,
}

/// Compiled file-name matcher for one [`ScriptNaming`] configuration.
///
/// The regexes are built once per loader; the version group accepts dotted
/// numeric labels (`1`, `4.2`, `2.0.13`).
struct NamePattern {
    versioned: Regex,
    repeatable: Regex,
}

impl NamePattern {
    fn compile(naming: &ScriptNaming) -> Result<Self> {
        let versioned = Regex::new(&format!(
            r"^{}(\d+(?:\.\d+)*){}(.+){}$",
            regex::escape(&naming.migration_prefix),
            regex::escape(&naming.separator),
            regex::escape(&naming.suffix)
        ))?;
        let repeatable = Regex::new(&format!(
            r"^{}{}(.+){}$",
            regex::escape(&naming.repeatable_prefix),
            regex::escape(&naming.separator),
            regex::escape(&naming.suffix)
        ))?;
        Ok(Self { versioned, repeatable })
    }

    /// Parses a file name; returns `None` when it does not follow the
    /// convention (such files are simply not migrations).
    fn parse(&self, file_name: &str) -> Result<Option<ParsedName>> {
        // Repeatable first: with a one-letter prefix like "R" the versioned
        // pattern can never shadow it, but custom prefixes may overlap.
        if let Some(caps) = self.repeatable.captures(file_name) {
            let stem = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let must_repeat_always = stem.ends_with(REPEAT_ALWAYS_MARKER);
            let stem = stem.trim_end_matches(REPEAT_ALWAYS_MARKER);
            return Ok(Some(ParsedName {
                category: ScriptCategory::Repeatable,
                version: None,
                description: stem.replace('_', " "),
                must_repeat_always,
            }));
        }
        if let Some(caps) = self.versioned.captures(file_name) {
            let label = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let stem = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let version = Version::parse(label)?;
            return Ok(Some(ParsedName {
                category: ScriptCategory::Versioned,
                version: Some(version),
                description: stem.replace('_', " "),
                must_repeat_always: false,
            }));
        }
        Ok(None)
    }
}

/// Enumerates the migration scripts the engine should consider.
///
/// `versioned_scripts` returns ascending version order; `repeatable_scripts`
/// any stable order (the shipped loaders sort by name).
pub trait MigrationLoader {
    fn versioned_scripts(&self) -> Result<Vec<MigrationScript>>;
    fn repeatable_scripts(&self) -> Result<Vec<MigrationScript>>;
}

/// Loads scripts from the configured filesystem locations.
pub struct FileLoader {
    locations: Vec<PathBuf>,
    pattern: NamePattern,
    encoding: &'static Encoding,
}

impl FileLoader {
    pub fn new(locations: Vec<PathBuf>, naming: &ScriptNaming, encoding: &'static Encoding) -> Result<Self> {
        Ok(Self {
            locations,
            pattern: NamePattern::compile(naming)?,
            encoding,
        })
    }

    /// Walks every location and collects scripts of the requested category.
    fn scan(&self, category: ScriptCategory) -> Result<Vec<MigrationScript>> {
        let mut scripts = Vec::new();
        for location in &self.locations {
            if !location.is_dir() {
                msg_debug!(format!("Skipping missing scripts location: {}", location.display()));
                continue;
            }
            for entry in WalkDir::new(location).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|e| msg_error_anyhow!(Message::ScriptsLocationUnreadable(location.display().to_string(), e.to_string())))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy().to_string();
                let Some(parsed) = self.pattern.parse(&file_name)? else {
                    continue;
                };
                if parsed.category != category {
                    continue;
                }
                scripts.push(MigrationScript::from_file(
                    parsed.category,
                    parsed.version,
                    file_name,
                    parsed.description,
                    parsed.must_repeat_always,
                    entry.path().to_path_buf(),
                    self.encoding,
                ));
            }
        }
        Ok(scripts)
    }
}

impl MigrationLoader for FileLoader {
    fn versioned_scripts(&self) -> Result<Vec<MigrationScript>> {
        let mut scripts = self.scan(ScriptCategory::Versioned)?;
        scripts.sort_by(|a, b| a.version.cmp(&b.version));
        check_versioned_unique(&scripts)?;
        Ok(scripts)
    }

    fn repeatable_scripts(&self) -> Result<Vec<MigrationScript>> {
        let mut scripts = self.scan(ScriptCategory::Repeatable)?;
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        check_names_unique(&scripts)?;
        Ok(scripts)
    }
}

/// Serves scripts from `(file name, bytes)` pairs supplied at construction.
///
/// Every supplied name must follow the naming convention; unlike the file
/// loader there is no directory noise to skip over, so a name that parses as
/// neither category is a configuration error.
pub struct EmbeddedLoader {
    versioned: Vec<MigrationScript>,
    repeatable: Vec<MigrationScript>,
}

impl EmbeddedLoader {
    pub fn new(sources: Vec<(String, Vec<u8>)>, naming: &ScriptNaming, encoding: &'static Encoding) -> Result<Self> {
        let pattern = NamePattern::compile(naming)?;
        let mut versioned = Vec::new();
        let mut repeatable = Vec::new();
        for (name, bytes) in sources {
            let parsed = pattern
                .parse(&name)?
                .ok_or_else(|| msg_error_anyhow!(Message::ScriptNameUnrecognized(name.clone())))?;
            let script = MigrationScript::from_bytes(
                parsed.category,
                parsed.version,
                name,
                parsed.description,
                parsed.must_repeat_always,
                bytes,
                encoding,
            );
            match parsed.category {
                ScriptCategory::Versioned => versioned.push(script),
                ScriptCategory::Repeatable => repeatable.push(script),
            }
        }
        versioned.sort_by(|a, b| a.version.cmp(&b.version));
        repeatable.sort_by(|a, b| a.name.cmp(&b.name));
        check_versioned_unique(&versioned)?;
        check_names_unique(&repeatable)?;
        Ok(Self { versioned, repeatable })
    }
}

impl MigrationLoader for EmbeddedLoader {
    fn versioned_scripts(&self) -> Result<Vec<MigrationScript>> {
        Ok(self.versioned.clone())
    }

    fn repeatable_scripts(&self) -> Result<Vec<MigrationScript>> {
        Ok(self.repeatable.clone())
    }
}

/// Rejects two versioned scripts carrying the same version.
fn check_versioned_unique(sorted: &[MigrationScript]) -> Result<()> {
    let mut by_version: HashMap<&Version, &str> = HashMap::new();
    for script in sorted {
        let version = script.version.as_ref().expect("versioned script without version");
        if let Some(first) = by_version.insert(version, &script.name) {
            return Err(msg_error_anyhow!(Message::DuplicateVersion(
                version.to_string(),
                first.to_string(),
                script.name.clone()
            )));
        }
    }
    check_names_unique(sorted)
}

/// Rejects two scripts sharing one canonical name.
fn check_names_unique(scripts: &[MigrationScript]) -> Result<()> {
    let mut seen = HashSet::new();
    for script in scripts {
        if !seen.insert(script.name.as_str()) {
            return Err(msg_error_anyhow!(Message::DuplicateScriptName(script.name.clone())));
        }
    }
    Ok(())
}
