//! Dotted numeric version labels for migration ordering.
//!
//! Migration scripts are ordered by a version label made of non-negative
//! integer components (`1`, `1.2`, `2.0.13`). Labels compare lexicographically
//! by component, so `1.2 < 1.10 < 2`. Two sentinels bound every possible
//! label: [`Version::Min`] sorts before all labels and [`Version::Max`] after
//! them. The sentinels are what the configuration defaults to when no start
//! or target version is set.
//!
//! ## Usage
//!
//! ```rust
//! use sqlevo::libs::version::Version;
//!
//! let v: Version = "1.2.3".parse()?;
//! let w: Version = "1.10".parse()?;
//! assert!(Version::Min < v && v < Version::Max);
//! assert!(v < w);
//! # anyhow::Ok(())
//! ```

use crate::libs::messages::Message;
use crate::msg_error_anyhow;
use std::fmt;
use std::str::FromStr;

/// A migration version label, bounded by two sentinels.
///
/// The derived ordering is exactly the ordering the engine needs: variants
/// compare by declaration order first (`Min < Label < Max`), and two labels
/// compare lexicographically by their components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// Sorts before every label; the default start version.
    Min,
    /// A parsed dotted label such as `1.2.3`.
    Label(Vec<u64>),
    /// Sorts after every label; the default target version.
    Max,
}

impl Version {
    /// Parses a dotted label like `"1"`, `"1.2"` or `"2.0.13"`.
    ///
    /// The sentinel spellings `"<min>"` and `"<max>"` round-trip from
    /// [`fmt::Display`]; anything else must be dot-separated non-negative
    /// integers.
    pub fn parse(label: &str) -> anyhow::Result<Self> {
        match label {
            "<min>" => return Ok(Version::Min),
            "<max>" => return Ok(Version::Max),
            _ => {}
        }
        let parts = label
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| msg_error_anyhow!(Message::InvalidVersionLabel(label.to_string())))?;
        if parts.is_empty() {
            return Err(msg_error_anyhow!(Message::InvalidVersionLabel(label.to_string())));
        }
        Ok(Version::Label(parts))
    }

    /// Returns true for a concrete label, false for the sentinels.
    pub fn is_label(&self) -> bool {
        matches!(self, Version::Label(_))
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Min => write!(f, "<min>"),
            Version::Max => write!(f, "<max>"),
            Version::Label(parts) => {
                let label = parts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
                write!(f, "{}", label)
            }
        }
    }
}
