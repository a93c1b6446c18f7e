//! Branch gate for promotion stages.
//!
//! Image publish, cluster deploy, and the version commit all mutate state
//! outside the pipeline (registry, cluster, source control). The gate
//! restricts those stages to exactly one branch so exploratory and
//! feature-branch runs stay side-effect free.

use serde::{Deserialize, Serialize};

/// Default target branch when none is configured.
pub const DEFAULT_TARGET_BRANCH: &str = "master";

/// Predicate restricting side-effecting stages to a single branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchGate {
    /// The only branch on which promotion stages run.
    pub target_branch: String,
}

impl BranchGate {
    /// Create a gate for the given target branch.
    pub fn new(target_branch: impl Into<String>) -> Self {
        Self {
            target_branch: target_branch.into(),
        }
    }

    /// Whether promotion stages may run for the given branch.
    ///
    /// Exact, case-sensitive string equality. No globs, no patterns.
    pub fn allows(&self, branch: &str) -> bool {
        branch == self.target_branch
    }
}

impl Default for BranchGate {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_BRANCH)
    }
}
