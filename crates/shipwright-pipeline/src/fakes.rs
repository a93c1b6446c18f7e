//! In-memory fakes for the collaborator traits (testing only).
//!
//! Every fake records its calls behind a `Mutex` and supports failure
//! injection, so the sequencer's skip/halt/ordering semantics can be pinned
//! without touching a registry, a cluster, or a git remote.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use shipwright_core::{BuildIdentifier, PipelineError, Result, Version, VersionStore};

use crate::collaborators::{
    ArtifactBuilder, ArtifactPath, ClusterDeployer, ImagePublisher, ImageRef, ManifestVars,
    SourceControlCommitter,
};

// ---------------------------------------------------------------------------
// MemoryVersionStore
// ---------------------------------------------------------------------------

/// In-memory version store seeded with an initial version.
pub struct MemoryVersionStore {
    version: Mutex<Version>,
    writes: Mutex<Vec<Version>>,
    fail_read: bool,
    fail_write: bool,
}

impl MemoryVersionStore {
    pub fn new(version: Version) -> Self {
        Self {
            version: Mutex::new(version),
            writes: Mutex::new(Vec::new()),
            fail_read: false,
            fail_write: false,
        }
    }

    /// A store whose `read` always fails with `Parse`.
    pub fn failing_read(version: Version) -> Self {
        Self {
            fail_read: true,
            ..Self::new(version)
        }
    }

    /// A store whose `write` always fails.
    pub fn failing_write(version: Version) -> Self {
        Self {
            fail_write: true,
            ..Self::new(version)
        }
    }

    /// Every version passed to `write`, in order.
    pub fn writes(&self) -> Vec<Version> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn read(&self) -> Result<Version> {
        if self.fail_read {
            return Err(PipelineError::Parse("descriptor unreadable".to_string()));
        }
        Ok(*self.version.lock().unwrap())
    }

    async fn write(&self, version: &Version) -> Result<()> {
        if self.fail_write {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "descriptor not writable",
            )));
        }
        *self.version.lock().unwrap() = *version;
        self.writes.lock().unwrap().push(*version);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeBuilder
// ---------------------------------------------------------------------------

/// Artifact builder fake with a call counter.
pub struct FakeBuilder {
    calls: Mutex<usize>,
    fail: bool,
}

impl FakeBuilder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Default for FakeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactBuilder for FakeBuilder {
    async fn build(&self) -> Result<ArtifactPath> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(PipelineError::Build("compilation failed".to_string()));
        }
        Ok(ArtifactPath(PathBuf::from("target/demo.jar")))
    }
}

// ---------------------------------------------------------------------------
// FakePublisher
// ---------------------------------------------------------------------------

/// Image publisher fake with separate build/push counters and failure
/// switches.
pub struct FakePublisher {
    repository: String,
    build_calls: Mutex<usize>,
    push_calls: Mutex<usize>,
    built_tags: Mutex<Vec<BuildIdentifier>>,
    fail_build: bool,
    fail_push: bool,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self {
            repository: "registry.example.com/demo".to_string(),
            build_calls: Mutex::new(0),
            push_calls: Mutex::new(0),
            built_tags: Mutex::new(Vec::new()),
            fail_build: false,
            fail_push: false,
        }
    }

    pub fn failing_build() -> Self {
        Self {
            fail_build: true,
            ..Self::new()
        }
    }

    pub fn failing_push() -> Self {
        Self {
            fail_push: true,
            ..Self::new()
        }
    }

    pub fn build_calls(&self) -> usize {
        *self.build_calls.lock().unwrap()
    }

    pub fn push_calls(&self) -> usize {
        *self.push_calls.lock().unwrap()
    }

    /// Tags passed to `build_image`, in order.
    pub fn built_tags(&self) -> Vec<BuildIdentifier> {
        self.built_tags.lock().unwrap().clone()
    }
}

impl Default for FakePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImagePublisher for FakePublisher {
    async fn build_image(
        &self,
        _artifact: &ArtifactPath,
        tag: &BuildIdentifier,
    ) -> Result<ImageRef> {
        *self.build_calls.lock().unwrap() += 1;
        self.built_tags.lock().unwrap().push(tag.clone());
        if self.fail_build {
            return Err(PipelineError::Build("image build failed".to_string()));
        }
        Ok(ImageRef(format!("{}:{}", self.repository, tag)))
    }

    async fn push(&self, _image: &ImageRef) -> Result<()> {
        *self.push_calls.lock().unwrap() += 1;
        if self.fail_push {
            return Err(PipelineError::Auth("push denied".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeDeployer
// ---------------------------------------------------------------------------

/// Cluster deployer fake that records every applied manifest and its vars.
pub struct FakeDeployer {
    applied: Mutex<Vec<(PathBuf, ManifestVars)>>,
    fail: bool,
}

impl FakeDeployer {
    pub fn new() -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    /// Applied (manifest path, vars) pairs, in order.
    pub fn applied(&self) -> Vec<(PathBuf, ManifestVars)> {
        self.applied.lock().unwrap().clone()
    }
}

impl Default for FakeDeployer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterDeployer for FakeDeployer {
    async fn apply(&self, manifest: &Path, vars: &ManifestVars) -> Result<()> {
        self.applied
            .lock()
            .unwrap()
            .push((manifest.to_path_buf(), vars.clone()));
        if self.fail {
            return Err(PipelineError::Apply("apply rejected".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeCommitter
// ---------------------------------------------------------------------------

/// Source-control committer fake recording commit messages and authors.
pub struct FakeCommitter {
    commits: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl FakeCommitter {
    pub fn new() -> Self {
        Self {
            commits: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.commits.lock().unwrap().len()
    }

    /// Recorded (message, author) pairs, in order.
    pub fn commits(&self) -> Vec<(String, String)> {
        self.commits.lock().unwrap().clone()
    }
}

impl Default for FakeCommitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceControlCommitter for FakeCommitter {
    async fn commit(&self, message: &str, author: &str) -> Result<()> {
        self.commits
            .lock()
            .unwrap()
            .push((message.to_string(), author.to_string()));
        if self.fail {
            return Err(PipelineError::Conflict(
                "commit rejected: non-fast-forward".to_string(),
            ));
        }
        Ok(())
    }
}
