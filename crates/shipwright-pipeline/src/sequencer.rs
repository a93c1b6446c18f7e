//! Promotion sequencing and run reporting.
//!
//! The sequencer drives one run through
//! `Init -> VersionBumped -> ArtifactBuilt -> [ImageBuilt -> Deployed ->
//! Committed] -> Done`, where the bracketed sub-chain executes only when the
//! branch gate allows it. Stages are strictly sequential: each one is a
//! blocking call to exactly one collaborator, the first failure halts the
//! run, and nothing already completed is rolled back (a pushed image is
//! immutable and safe to leave published).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use shipwright_core::{BranchGate, BuildIdentifier, RunContext, Version, VersionStore};

use crate::collaborators::{
    ArtifactBuilder, ClusterDeployer, ImagePublisher, ManifestVars, SourceControlCommitter,
};

/// A stage the sequencer can be in when something goes wrong, and the unit
/// of per-stage reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VersionBumped,
    ArtifactBuilt,
    ImageBuilt,
    Deployed,
    Committed,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::VersionBumped => "version_bumped",
            Stage::ArtifactBuilt => "artifact_built",
            Stage::ImageBuilt => "image_built",
            Stage::Deployed => "deployed",
            Stage::Committed => "committed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineOutcome {
    NotStarted,
    Running,
    Succeeded,
    Failed { stage: Stage, cause: String },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Succeeded)
    }
}

/// Timing record for one executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub duration_ms: u64,
}

/// Result of one complete sequencer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id for this run.
    pub run_id: Uuid,

    /// Branch the run executed against.
    pub branch: String,

    /// Whether the branch gate admitted the promotion stages.
    pub gated_in: bool,

    /// Final outcome.
    pub outcome: PipelineOutcome,

    /// Identifier computed for this run (absent only when the version could
    /// not be read or the run counter was invalid).
    pub identifier: Option<BuildIdentifier>,

    /// Version read from the store at run start.
    pub version_before: Option<Version>,

    /// Version persisted by this run; `None` when the run never reached the
    /// persistence point (failed, or non-target branch).
    pub version_after: Option<Version>,

    /// Stages that actually executed, in order.
    pub stages: Vec<StageReport>,

    /// Total wall time.
    pub duration_ms: u64,

    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunReport {
    /// Whether a given stage executed during this run.
    pub fn ran(&self, stage: Stage) -> bool {
        self.stages.iter().any(|s| s.stage == stage)
    }
}

/// Drives one run through the promotion stages.
pub struct PromotionSequencer {
    store: Arc<dyn VersionStore>,
    builder: Arc<dyn ArtifactBuilder>,
    publisher: Arc<dyn ImagePublisher>,
    deployer: Arc<dyn ClusterDeployer>,
    committer: Arc<dyn SourceControlCommitter>,
    gate: BranchGate,
    app_name: String,
    deployment_manifest: PathBuf,
    service_manifest: PathBuf,
    commit_author: String,
}

impl PromotionSequencer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn VersionStore>,
        builder: Arc<dyn ArtifactBuilder>,
        publisher: Arc<dyn ImagePublisher>,
        deployer: Arc<dyn ClusterDeployer>,
        committer: Arc<dyn SourceControlCommitter>,
        gate: BranchGate,
        app_name: impl Into<String>,
        deployment_manifest: impl Into<PathBuf>,
        service_manifest: impl Into<PathBuf>,
        commit_author: impl Into<String>,
    ) -> Self {
        Self {
            store,
            builder,
            publisher,
            deployer,
            committer,
            gate,
            app_name: app_name.into(),
            deployment_manifest: deployment_manifest.into(),
            service_manifest: service_manifest.into(),
            commit_author: commit_author.into(),
        }
    }

    /// Execute one run.
    ///
    /// Never returns an error: every failure is captured in the report's
    /// outcome together with the stage that raised it, so the host
    /// orchestrator gets the full picture either way.
    pub async fn run(&self, ctx: &RunContext) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        // The gate is evaluated exactly once per run.
        let gated_in = self.gate.allows(&ctx.branch);

        let mut report = RunReport {
            run_id,
            branch: ctx.branch.clone(),
            gated_in,
            outcome: PipelineOutcome::Running,
            identifier: None,
            version_before: None,
            version_after: None,
            stages: Vec::new(),
            duration_ms: 0,
            started_at,
        };

        info!(run_id = %run_id, branch = %ctx.branch, run_counter = ctx.run_counter, gated_in, "starting promotion run");

        let fail = |report: &mut RunReport, stage: Stage, cause: String, start: &Instant| {
            error!(run_id = %run_id, stage = %stage, %cause, "promotion run failed");
            report.outcome = PipelineOutcome::Failed { stage, cause };
            report.duration_ms = start.elapsed().as_millis() as u64;
        };

        // VersionBumped: read the current version, compute the bump and the
        // identifier in memory. Persistence is deferred until the run is
        // certain to succeed (see Committed below), so a failed run never
        // advances the stored version.
        let stage_start = Instant::now();
        let current = match self.store.read().await {
            Ok(v) => v,
            Err(e) => {
                fail(&mut report, Stage::VersionBumped, e.to_string(), &start);
                return report;
            }
        };
        report.version_before = Some(current);
        let next = current.next_patch();

        let identifier = match BuildIdentifier::new(&next, ctx.run_counter) {
            Ok(id) => id,
            Err(e) => {
                fail(&mut report, Stage::VersionBumped, e.to_string(), &start);
                return report;
            }
        };
        report.identifier = Some(identifier.clone());
        report.stages.push(StageReport {
            stage: Stage::VersionBumped,
            duration_ms: stage_start.elapsed().as_millis() as u64,
        });
        info!(run_id = %run_id, version = %next, identifier = %identifier, "version bumped");

        // ArtifactBuilt: always runs, gated or not.
        let stage_start = Instant::now();
        let artifact = match self.builder.build().await {
            Ok(a) => a,
            Err(e) => {
                fail(&mut report, Stage::ArtifactBuilt, e.to_string(), &start);
                return report;
            }
        };
        report.stages.push(StageReport {
            stage: Stage::ArtifactBuilt,
            duration_ms: stage_start.elapsed().as_millis() as u64,
        });
        info!(run_id = %run_id, artifact = %artifact.as_path().display(), "artifact built");

        if !gated_in {
            info!(run_id = %run_id, branch = %ctx.branch, target = %self.gate.target_branch, "branch gate closed, skipping promotion stages");
            report.outcome = PipelineOutcome::Succeeded;
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }

        // ImageBuilt: build and push under the same identifier the deploy
        // stage will reference.
        let stage_start = Instant::now();
        let image = match self.publisher.build_image(&artifact, &identifier).await {
            Ok(i) => i,
            Err(e) => {
                fail(&mut report, Stage::ImageBuilt, e.to_string(), &start);
                return report;
            }
        };
        if let Err(e) = self.publisher.push(&image).await {
            fail(&mut report, Stage::ImageBuilt, e.to_string(), &start);
            return report;
        }
        report.stages.push(StageReport {
            stage: Stage::ImageBuilt,
            duration_ms: stage_start.elapsed().as_millis() as u64,
        });
        info!(run_id = %run_id, image = %image, "image published");

        // Deployed: deployment manifest, then service manifest, both with
        // the same image reference.
        let stage_start = Instant::now();
        let vars = ManifestVars {
            app_name: self.app_name.clone(),
            image_name: image.as_str().to_string(),
        };
        for manifest in [&self.deployment_manifest, &self.service_manifest] {
            if let Err(e) = self.deployer.apply(manifest, &vars).await {
                fail(&mut report, Stage::Deployed, e.to_string(), &start);
                return report;
            }
        }
        report.stages.push(StageReport {
            stage: Stage::Deployed,
            duration_ms: stage_start.elapsed().as_millis() as u64,
        });
        info!(run_id = %run_id, "manifests applied");

        // Committed: persist the bumped version now that the deploy has
        // landed, then commit the descriptor change.
        let stage_start = Instant::now();
        if let Err(e) = self.store.write(&next).await {
            fail(&mut report, Stage::Committed, e.to_string(), &start);
            return report;
        }
        report.version_after = Some(next);

        let message = format!("Bump version to {next}");
        if let Err(e) = self.committer.commit(&message, &self.commit_author).await {
            fail(&mut report, Stage::Committed, e.to_string(), &start);
            return report;
        }
        report.stages.push(StageReport {
            stage: Stage::Committed,
            duration_ms: stage_start.elapsed().as_millis() as u64,
        });

        report.outcome = PipelineOutcome::Succeeded;
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(run_id = %run_id, duration_ms = report.duration_ms, "promotion run succeeded");
        report
    }
}
