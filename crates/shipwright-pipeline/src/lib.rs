//! Shipwright Pipeline
//!
//! The promotion sequencer and its collaborator seams:
//! - Narrow async traits for the external tools (artifact build, image
//!   build/push, cluster apply, source-control commit)
//! - Process-backed implementations invoking those tools through their CLIs
//! - The strictly sequential, fail-fast [`PromotionSequencer`]
//! - Public in-memory fakes so the sequencer is testable without I/O

pub mod collaborators;
pub mod config;
pub mod exec;
pub mod fakes;
pub mod manifest;
pub mod sequencer;
pub mod telemetry;

// Re-export key types
pub use collaborators::{
    ArtifactBuilder, ArtifactPath, ClusterDeployer, ImagePublisher, ImageRef, ManifestVars,
    SourceControlCommitter,
};
pub use config::PipelineConfig;
pub use exec::{DockerPublisher, GitCommitter, KubectlDeployer, MavenBuilder};
pub use sequencer::{PipelineOutcome, PromotionSequencer, RunReport, Stage, StageReport};
pub use telemetry::init_tracing;
