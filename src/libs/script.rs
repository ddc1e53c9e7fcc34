//! Migration script values and checksum calculation.
//!
//! A [`MigrationScript`] is an immutable description of one SQL script: its
//! category (versioned or repeatable), optional version label, canonical name,
//! display description and a body that is loaded on demand from disk or from
//! embedded bytes. The checksum is a stable hash over the normalized body and
//! is what the engine compares against the metadata history to detect drift.
//!
//! ## Checksum stability
//!
//! Bodies are decoded with the configured encoding and normalized (CRLF to
//! LF) before hashing, so the same script checked out with different line
//! endings produces the same checksum. The hash is `SipHasher13` with a fixed
//! zero key: the default hasher's algorithm is not guaranteed across Rust
//! releases, so an explicit implementation keeps stored checksums comparable
//! forever.

use crate::libs::messages::Message;
use crate::libs::version::Version;
use crate::msg_error_anyhow;
use anyhow::Result;
use encoding_rs::Encoding;
use siphasher::sip::SipHasher13;
use std::fs;
use std::hash::Hasher;
use std::path::PathBuf;

/// The two kinds of migration script the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCategory {
    /// Applied once, in ascending version order.
    Versioned,
    /// Re-applied whenever its checksum changes.
    Repeatable,
}

/// Where a script body comes from.
#[derive(Debug, Clone)]
enum ScriptSource {
    /// A file under one of the configured locations.
    File(PathBuf),
    /// Bytes compiled into the caller, e.g. via `include_bytes!`.
    Embedded(Vec<u8>),
}

/// An immutable migration script record.
///
/// Versioned scripts always carry a version label; repeatable scripts never
/// do. Names are unique across both categories, which the loader enforces.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    pub category: ScriptCategory,
    pub version: Option<Version>,
    /// Canonical file name, e.g. `V1.2__create_users.sql`.
    pub name: String,
    /// Display string derived from the name, e.g. `create users`.
    pub description: String,
    /// Repeatable scripts with this flag re-run every migration, checksum or not.
    pub must_repeat_always: bool,
    source: ScriptSource,
    encoding: &'static Encoding,
}

impl MigrationScript {
    /// Creates a versioned or repeatable script backed by a file on disk.
    pub fn from_file(
        category: ScriptCategory,
        version: Option<Version>,
        name: String,
        description: String,
        must_repeat_always: bool,
        path: PathBuf,
        encoding: &'static Encoding,
    ) -> Self {
        Self {
            category,
            version,
            name,
            description,
            must_repeat_always,
            source: ScriptSource::File(path),
            encoding,
        }
    }

    /// Creates a script backed by embedded bytes.
    pub fn from_bytes(
        category: ScriptCategory,
        version: Option<Version>,
        name: String,
        description: String,
        must_repeat_always: bool,
        bytes: Vec<u8>,
        encoding: &'static Encoding,
    ) -> Self {
        Self {
            category,
            version,
            name,
            description,
            must_repeat_always,
            source: ScriptSource::Embedded(bytes),
            encoding,
        }
    }

    /// Loads and decodes the script body.
    ///
    /// The raw bytes are fetched from the backing source on every call; the
    /// engine reads each body at most twice per run (checksum and execution).
    pub fn body(&self) -> Result<String> {
        let bytes = match &self.source {
            ScriptSource::File(path) => fs::read(path).map_err(|e| msg_error_anyhow!(Message::ScriptReadFailed(self.name.clone(), e.to_string())))?,
            ScriptSource::Embedded(bytes) => bytes.clone(),
        };
        let (decoded, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            return Err(msg_error_anyhow!(Message::ScriptDecodeFailed(self.name.clone(), self.encoding.name().to_string())));
        }
        Ok(decoded.into_owned())
    }

    /// Calculates the checksum of the normalized body.
    pub fn checksum(&self) -> Result<String> {
        let body = self.body()?;
        Ok(checksum_of(&body))
    }
}

/// Hashes an already-decoded body the way [`MigrationScript::checksum`] does.
///
/// Exposed so callers that hold a body in memory can compare it against a
/// stored checksum without re-reading the source.
pub fn checksum_of(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");
    let mut hasher = SipHasher13::new();
    hasher.write(normalized.as_bytes());
    format!("{:016x}", hasher.finish())
}
