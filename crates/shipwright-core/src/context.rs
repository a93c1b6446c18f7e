//! Orchestrator-supplied run context.
//!
//! The branch name and run counter come from the hosting orchestrator's
//! execution environment. Both are read-only inputs: this core never
//! generates a run counter and never mutates the branch name.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Environment variable carrying the current branch name.
pub const BRANCH_ENV: &str = "BRANCH_NAME";

/// Environment variable carrying the monotonic run counter.
pub const BUILD_NUMBER_ENV: &str = "BUILD_NUMBER";

/// Read-only inputs supplied by the host orchestrator for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunContext {
    /// Source-control branch the run executes against.
    pub branch: String,

    /// Monotonically increasing run counter, unique per run. Used only for
    /// tag uniqueness, never for ordering.
    pub run_counter: i64,
}

impl RunContext {
    /// Create a run context from explicit values.
    pub fn new(branch: impl Into<String>, run_counter: i64) -> Self {
        Self {
            branch: branch.into(),
            run_counter,
        }
    }

    /// Read the context from the orchestrator's environment variables.
    ///
    /// Fails with `InvalidInput` when either variable is absent or the
    /// counter is not an integer.
    pub fn from_env() -> Result<Self> {
        let branch = std::env::var(BRANCH_ENV)
            .map_err(|_| PipelineError::InvalidInput(format!("{BRANCH_ENV} is not set")))?;

        let raw = std::env::var(BUILD_NUMBER_ENV)
            .map_err(|_| PipelineError::InvalidInput(format!("{BUILD_NUMBER_ENV} is not set")))?;
        let run_counter = raw.trim().parse::<i64>().map_err(|_| {
            PipelineError::InvalidInput(format!("{BUILD_NUMBER_ENV} is not an integer: '{raw}'"))
        })?;

        Ok(Self {
            branch,
            run_counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_new() {
        let ctx = RunContext::new("master", 42);
        assert_eq!(ctx.branch, "master");
        assert_eq!(ctx.run_counter, 42);
    }

    #[test]
    fn test_run_context_serde_roundtrip() {
        let ctx = RunContext::new("feature/login", 7);
        let json = serde_json::to_string(&ctx).unwrap();
        let back: RunContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
