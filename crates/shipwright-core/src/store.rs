//! Version store: persistence seam for the project descriptor.
//!
//! The descriptor is the single piece of state shared across runs over time
//! (never across concurrent runs). The sequencer treats the in-memory bump
//! as provisional and calls [`VersionStore::write`] only once the run is
//! certain to succeed, so a failed run never advances the persisted version.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::version::Version;

/// Read/write access to the persisted project version.
///
/// Guarantees:
/// - `read` returns the version currently persisted, or `Parse` when the
///   descriptor is missing or malformed.
/// - `write` replaces the persisted version without losing any other
///   descriptor content.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Read the current version from the descriptor.
    async fn read(&self) -> Result<Version>;

    /// Persist a new version, preserving the rest of the descriptor.
    async fn write(&self, version: &Version) -> Result<()>;
}

/// File-backed version store over a JSON project descriptor.
///
/// The descriptor is any JSON object with a top-level `"version"` string
/// field, e.g. `{"name": "demo", "version": "1.0.0"}`. Writes update only
/// that field and are atomic (temp file in the same directory, then rename).
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    /// Create a store over the descriptor at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the descriptor file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_descriptor(&self) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::Parse(format!(
                "cannot read descriptor {}: {e}",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Parse(format!(
                "descriptor {} is not valid JSON: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn read(&self) -> Result<Version> {
        let descriptor = self.load_descriptor().await?;
        let version = descriptor
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PipelineError::Parse(format!(
                    "descriptor {} has no string 'version' field",
                    self.path.display()
                ))
            })?;
        Version::parse(version)
    }

    async fn write(&self, version: &Version) -> Result<()> {
        let mut descriptor = self.load_descriptor().await?;
        match descriptor.as_object_mut() {
            Some(obj) => {
                obj.insert("version".to_string(), Value::String(version.to_string()));
            }
            None => {
                return Err(PipelineError::Parse(format!(
                    "descriptor {} is not a JSON object",
                    self.path.display()
                )))
            }
        }

        let rendered = serde_json::to_string_pretty(&descriptor)?;

        // Atomic write: temp file in the same directory, then rename over.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, rendered.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}
