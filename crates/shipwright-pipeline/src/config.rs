//! Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use shipwright_core::gate::DEFAULT_TARGET_BRANCH;
use shipwright_core::{PipelineError, Result};

fn default_target_branch() -> String {
    DEFAULT_TARGET_BRANCH.to_string()
}

fn default_descriptor_path() -> PathBuf {
    PathBuf::from("project.json")
}

fn default_commit_author() -> String {
    "shipwright <ci@shipwright.dev>".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    600
}

/// Static configuration for one pipeline installation.
///
/// Loaded from a JSON file; orchestrator-supplied values (branch, run
/// counter) arrive separately through `RunContext`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Application name, substituted for `${APP_NAME}` in manifests.
    pub app_name: String,

    /// The only branch on which promotion stages run.
    #[serde(default = "default_target_branch")]
    pub target_branch: String,

    /// Registry host (e.g. `registry.example.com`).
    pub registry: String,

    /// Image repository within the registry (e.g. `team/demo`).
    pub repository: String,

    /// Path to the project descriptor holding the version.
    #[serde(default = "default_descriptor_path")]
    pub descriptor_path: PathBuf,

    /// Deployment manifest template.
    pub deployment_manifest: PathBuf,

    /// Service manifest template.
    pub service_manifest: PathBuf,

    /// Author used for the version-bump commit.
    #[serde(default = "default_commit_author")]
    pub commit_author: String,

    /// Per-tool timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Parse(format!("cannot read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Parse(format!("config {} is invalid: {e}", path.display()))
        })
    }

    /// The image repository prefixed with the registry host.
    pub fn image_repository(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }
}
