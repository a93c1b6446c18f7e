//! Build identifier construction.
//!
//! A [`BuildIdentifier`] is the image tag for one pipeline run:
//! `{major}.{minor}.{patch}-{run_counter}`. It is computed exactly once per
//! run and reused by every downstream stage, so the image-build and deploy
//! stages always reference the same artifact.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::version::Version;

/// Unique tag identifying one pipeline run's output image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildIdentifier(String);

impl BuildIdentifier {
    /// Build the identifier from a version and the orchestrator's run counter.
    ///
    /// Deterministic: identical inputs always yield the identical string.
    /// Fails with `InvalidInput` when the run counter is not positive.
    pub fn new(version: &Version, run_counter: i64) -> Result<Self> {
        if run_counter <= 0 {
            return Err(PipelineError::InvalidInput(format!(
                "run counter must be positive, got {run_counter}"
            )));
        }
        Ok(Self(format!("{version}-{run_counter}")))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BuildIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
