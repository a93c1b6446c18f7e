//! Semantic version parsing and patch arithmetic.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PipelineError, Result};

/// Project version: MAJOR.MINOR.PATCH, each a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a version from its components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `X.Y.Z` version string.
    ///
    /// Rejects anything that is not exactly three dot-separated base-10
    /// integers: pre-release suffixes, leading `v`, empty components.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(PipelineError::Parse(format!(
                "version must be MAJOR.MINOR.PATCH, got '{input}'"
            )));
        }

        let component = |s: &str, name: &str| -> Result<u64> {
            s.parse::<u64>().map_err(|_| {
                PipelineError::Parse(format!("invalid {name} component '{s}' in '{input}'"))
            })
        };

        Ok(Self {
            major: component(parts[0], "major")?,
            minor: component(parts[1], "minor")?,
            patch: component(parts[2], "patch")?,
        })
    }

    /// The next incremental version: patch + 1, major/minor unchanged.
    pub fn next_patch(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor,
            patch: self.patch + 1,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for Version {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

// Versions serialize through their string form so the descriptor stores
// "1.2.3" rather than a nested object.
impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(D::Error::custom)
    }
}
