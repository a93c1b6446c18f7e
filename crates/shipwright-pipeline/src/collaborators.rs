//! Collaborator trait seams.
//!
//! Each external tool the sequencer drives sits behind a narrow async trait
//! with an explicit success/failure result, so the sequencer can be tested
//! with substitutes that never perform real I/O. All traits are invoked at
//! most once per stage and never retried.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shipwright_core::{BuildIdentifier, Result};

/// Path to the packaged build output prior to containerization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPath(pub PathBuf);

impl ArtifactPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Fully-qualified image reference (`registry/repository:tag`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variables substituted into a manifest template before apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestVars {
    /// Substituted for `${APP_NAME}`.
    pub app_name: String,

    /// Substituted for `${IMAGE_NAME}` (the full image reference).
    pub image_name: String,
}

/// Builds the application artifact (the Maven-equivalent step).
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Build the artifact, returning its path. Invoked once per run.
    async fn build(&self) -> Result<ArtifactPath>;
}

/// Builds and pushes the container image.
#[async_trait]
pub trait ImagePublisher: Send + Sync {
    /// Build an image from the artifact, tagged with the build identifier.
    async fn build_image(&self, artifact: &ArtifactPath, tag: &BuildIdentifier)
        -> Result<ImageRef>;

    /// Push a previously built image to the registry.
    async fn push(&self, image: &ImageRef) -> Result<()>;
}

/// Applies a manifest to the cluster with variables substituted.
#[async_trait]
pub trait ClusterDeployer: Send + Sync {
    /// Render the template at `manifest` with `vars` and apply it.
    async fn apply(&self, manifest: &Path, vars: &ManifestVars) -> Result<()>;
}

/// Commits the version bump back to source control.
///
/// Implementations use a scoped credential distinct from normal developer
/// credentials.
#[async_trait]
pub trait SourceControlCommitter: Send + Sync {
    async fn commit(&self, message: &str, author: &str) -> Result<()>;
}
