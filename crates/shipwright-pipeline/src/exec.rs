//! Process-backed collaborators.
//!
//! Real implementations of the collaborator traits that shell out to the
//! external tools (mvn, docker, kubectl, git). Each invocation captures
//! stdout/stderr, honors an optional timeout, and maps a non-zero exit into
//! the pipeline error taxonomy. No tool is ever retried.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use shipwright_core::{BuildIdentifier, PipelineError, Result};

use crate::collaborators::{
    ArtifactBuilder, ArtifactPath, ClusterDeployer, ImagePublisher, ImageRef, ManifestVars,
    SourceControlCommitter,
};
use crate::manifest;

/// Captured output of one tool invocation.
#[derive(Debug, Clone)]
pub(crate) struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Run an external tool with piped stdio and an optional timeout.
///
/// Spawn failures and timeouts surface as `std::io::Error`; a non-zero exit
/// is reported through `ToolOutput`, not as an error, so callers can map it
/// into their own taxonomy variant.
pub(crate) async fn run_tool(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout_secs: u64,
) -> std::io::Result<ToolOutput> {
    debug!(program, ?args, "invoking tool");

    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn()?;

    let output = if timeout_secs > 0 {
        tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{program} timed out after {timeout_secs}s"),
                )
            })??
    } else {
        child.wait_with_output().await?
    };

    Ok(ToolOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
    })
}

fn looks_like_auth_failure(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("unauthorized")
        || lower.contains("denied")
        || lower.contains("authentication")
        || lower.contains("permission")
}

// ---------------------------------------------------------------------------
// MavenBuilder
// ---------------------------------------------------------------------------

/// Artifact builder shelling out to `mvn`.
pub struct MavenBuilder {
    workdir: PathBuf,
    timeout_secs: u64,
}

impl MavenBuilder {
    pub fn new(workdir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            workdir: workdir.into(),
            timeout_secs,
        }
    }
}

/// Locate the packaged artifact under `target/` after a successful build.
pub(crate) async fn find_artifact(target_dir: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(target_dir).await.map_err(|e| {
        PipelineError::Build(format!("no build output at {}: {e}", target_dir.display()))
    })?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("jar") | Some("war") => return Ok(path),
            _ => {}
        }
    }

    Err(PipelineError::Build(format!(
        "no packaged artifact (.jar/.war) under {}",
        target_dir.display()
    )))
}

#[async_trait]
impl ArtifactBuilder for MavenBuilder {
    async fn build(&self) -> Result<ArtifactPath> {
        info!(workdir = %self.workdir.display(), "building artifact with mvn");

        let output = run_tool(
            "mvn",
            &["-B", "-DskipTests", "clean", "package"],
            Some(&self.workdir),
            self.timeout_secs,
        )
        .await
        .map_err(|e| PipelineError::Build(format!("failed to run mvn: {e}")))?;

        if !output.success {
            return Err(PipelineError::Build(format!(
                "mvn package exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let artifact = find_artifact(&self.workdir.join("target")).await?;
        info!(artifact = %artifact.display(), "artifact built");
        Ok(ArtifactPath(artifact))
    }
}

// ---------------------------------------------------------------------------
// DockerPublisher
// ---------------------------------------------------------------------------

/// Image publisher shelling out to `docker build` / `docker push`.
pub struct DockerPublisher {
    image_repository: String,
    workdir: PathBuf,
    timeout_secs: u64,
}

impl DockerPublisher {
    /// `image_repository` is the registry-qualified repository, e.g.
    /// `registry.example.com/team/demo`.
    pub fn new(
        image_repository: impl Into<String>,
        workdir: impl Into<PathBuf>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            image_repository: image_repository.into(),
            workdir: workdir.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ImagePublisher for DockerPublisher {
    async fn build_image(
        &self,
        artifact: &ArtifactPath,
        tag: &BuildIdentifier,
    ) -> Result<ImageRef> {
        let image_ref = ImageRef(format!("{}:{}", self.image_repository, tag));
        info!(image = %image_ref, artifact = %artifact.as_path().display(), "building image");

        let output = run_tool(
            "docker",
            &["build", "-t", image_ref.as_str(), "."],
            Some(&self.workdir),
            self.timeout_secs,
        )
        .await
        .map_err(|e| PipelineError::Build(format!("failed to run docker build: {e}")))?;

        if !output.success {
            return Err(PipelineError::Build(format!(
                "docker build exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        Ok(image_ref)
    }

    async fn push(&self, image: &ImageRef) -> Result<()> {
        info!(image = %image, "pushing image");

        let output = run_tool(
            "docker",
            &["push", image.as_str()],
            Some(&self.workdir),
            self.timeout_secs,
        )
        .await
        .map_err(|e| PipelineError::Network(format!("failed to run docker push: {e}")))?;

        if !output.success {
            let detail = format!(
                "docker push exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            );
            return if looks_like_auth_failure(&output.stderr) {
                Err(PipelineError::Auth(detail))
            } else {
                Err(PipelineError::Network(detail))
            };
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// KubectlDeployer
// ---------------------------------------------------------------------------

/// Cluster deployer shelling out to `kubectl apply`.
pub struct KubectlDeployer {
    timeout_secs: u64,
}

impl KubectlDeployer {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl ClusterDeployer for KubectlDeployer {
    async fn apply(&self, manifest_path: &Path, vars: &ManifestVars) -> Result<()> {
        let rendered = manifest::render_file(manifest_path, vars).await?;

        // kubectl reads the rendered manifest from a temp file; the template
        // on disk is never modified.
        let dir = tempfile::tempdir()?;
        let rendered_path = dir.path().join("manifest.yaml");
        tokio::fs::write(&rendered_path, rendered.as_bytes()).await?;

        info!(manifest = %manifest_path.display(), image = %vars.image_name, "applying manifest");

        let rendered_arg = rendered_path.to_string_lossy().to_string();
        let output = run_tool(
            "kubectl",
            &["apply", "-f", &rendered_arg],
            None,
            self.timeout_secs,
        )
        .await
        .map_err(|e| PipelineError::Apply(format!("failed to run kubectl: {e}")))?;

        if !output.success {
            return Err(PipelineError::Apply(format!(
                "kubectl apply of {} exited with code {}: {}",
                manifest_path.display(),
                output.exit_code,
                output.stderr.trim()
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GitCommitter
// ---------------------------------------------------------------------------

/// Source-control committer shelling out to `git`.
///
/// Stages the project descriptor, commits with the configured author, and
/// pushes. The credential used for the push is expected to be injected by
/// the host orchestrator and scoped to this pipeline.
pub struct GitCommitter {
    repo_dir: PathBuf,
    descriptor_path: PathBuf,
    timeout_secs: u64,
}

impl GitCommitter {
    pub fn new(
        repo_dir: impl Into<PathBuf>,
        descriptor_path: impl Into<PathBuf>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            descriptor_path: descriptor_path.into(),
            timeout_secs,
        }
    }

    async fn git(&self, args: &[&str]) -> Result<ToolOutput> {
        run_tool("git", args, Some(&self.repo_dir), self.timeout_secs)
            .await
            .map_err(|e| PipelineError::Conflict(format!("failed to run git: {e}")))
    }
}

#[async_trait]
impl SourceControlCommitter for GitCommitter {
    async fn commit(&self, message: &str, author: &str) -> Result<()> {
        info!(commit_message = message, author, "committing version bump");

        let descriptor = self.descriptor_path.to_string_lossy().to_string();
        let add = self.git(&["add", &descriptor]).await?;
        if !add.success {
            return Err(PipelineError::Conflict(format!(
                "git add failed: {}",
                add.stderr.trim()
            )));
        }

        let commit = self
            .git(&["commit", "-m", message, "--author", author])
            .await?;
        if !commit.success {
            return Err(PipelineError::Conflict(format!(
                "git commit failed: {}",
                commit.stderr.trim()
            )));
        }

        let push = self.git(&["push"]).await?;
        if !push.success {
            let detail = format!("git push failed: {}", push.stderr.trim());
            return if looks_like_auth_failure(&push.stderr) {
                Err(PipelineError::Auth(detail))
            } else {
                Err(PipelineError::Conflict(detail))
            };
        }

        Ok(())
    }
}
