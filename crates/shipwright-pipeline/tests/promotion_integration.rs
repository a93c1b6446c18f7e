//! Integration tests for the promotion sequencer, driven entirely by fakes.

use std::sync::Arc;

use shipwright_core::{BranchGate, RunContext, Version, VersionStore};
use shipwright_pipeline::fakes::{
    FakeBuilder, FakeCommitter, FakeDeployer, FakePublisher, MemoryVersionStore,
};
use shipwright_pipeline::{PipelineOutcome, PromotionSequencer, Stage};

struct Rig {
    store: Arc<MemoryVersionStore>,
    builder: Arc<FakeBuilder>,
    publisher: Arc<FakePublisher>,
    deployer: Arc<FakeDeployer>,
    committer: Arc<FakeCommitter>,
    sequencer: PromotionSequencer,
}

fn rig_with(
    store: MemoryVersionStore,
    builder: FakeBuilder,
    publisher: FakePublisher,
    deployer: FakeDeployer,
    committer: FakeCommitter,
) -> Rig {
    let store = Arc::new(store);
    let builder = Arc::new(builder);
    let publisher = Arc::new(publisher);
    let deployer = Arc::new(deployer);
    let committer = Arc::new(committer);

    let sequencer = PromotionSequencer::new(
        store.clone(),
        builder.clone(),
        publisher.clone(),
        deployer.clone(),
        committer.clone(),
        BranchGate::new("master"),
        "demo",
        "k8s/deployment.yaml",
        "k8s/service.yaml",
        "ci-bot <ci@example.com>",
    );

    Rig {
        store,
        builder,
        publisher,
        deployer,
        committer,
        sequencer,
    }
}

fn default_rig() -> Rig {
    rig_with(
        MemoryVersionStore::new(Version::new(1, 0, 0)),
        FakeBuilder::new(),
        FakePublisher::new(),
        FakeDeployer::new(),
        FakeCommitter::new(),
    )
}

/// End-to-end on the target branch: every gated stage runs exactly once.
#[tokio::test]
async fn test_full_promotion_on_target_branch() {
    let rig = default_rig();
    let report = rig.sequencer.run(&RunContext::new("master", 123)).await;

    assert_eq!(report.outcome, PipelineOutcome::Succeeded);
    assert!(report.gated_in);
    assert_eq!(report.identifier.as_ref().unwrap().as_str(), "1.0.1-123");
    assert_eq!(report.version_before, Some(Version::new(1, 0, 0)));
    assert_eq!(report.version_after, Some(Version::new(1, 0, 1)));

    assert_eq!(rig.builder.calls(), 1);
    assert_eq!(rig.publisher.build_calls(), 1);
    assert_eq!(rig.publisher.push_calls(), 1);
    assert_eq!(rig.committer.calls(), 1);

    // Deployment manifest then service manifest, same image for both.
    let applied = rig.deployer.applied();
    assert_eq!(applied.len(), 2);
    assert!(applied[0].0.ends_with("deployment.yaml"));
    assert!(applied[1].0.ends_with("service.yaml"));
    for (_, vars) in &applied {
        assert_eq!(vars.app_name, "demo");
        assert!(vars.image_name.contains("1.0.1-123"));
    }

    // Version persisted exactly once, with the bumped value.
    assert_eq!(rig.store.writes(), vec![Version::new(1, 0, 1)]);

    // Commit message carries the new version.
    let commits = rig.committer.commits();
    assert_eq!(commits.len(), 1);
    assert!(commits[0].0.contains("1.0.1"));
    assert_eq!(commits[0].1, "ci-bot <ci@example.com>");

    for stage in [
        Stage::VersionBumped,
        Stage::ArtifactBuilt,
        Stage::ImageBuilt,
        Stage::Deployed,
        Stage::Committed,
    ] {
        assert!(report.ran(stage), "stage {stage} should have run");
    }
}

/// Feature branches build the artifact and nothing else.
#[tokio::test]
async fn test_feature_branch_skips_promotion_stages() {
    let rig = default_rig();
    let report = rig
        .sequencer
        .run(&RunContext::new("feature/login", 123))
        .await;

    assert_eq!(report.outcome, PipelineOutcome::Succeeded);
    assert!(!report.gated_in);
    // Identifier is still computed deterministically from the same inputs.
    assert_eq!(report.identifier.as_ref().unwrap().as_str(), "1.0.1-123");

    assert_eq!(rig.builder.calls(), 1);
    assert_eq!(rig.publisher.build_calls(), 0);
    assert_eq!(rig.publisher.push_calls(), 0);
    assert_eq!(rig.deployer.calls(), 0);
    assert_eq!(rig.committer.calls(), 0);

    // The bump is never persisted off the target branch.
    assert_eq!(rig.store.write_count(), 0);
    assert_eq!(report.version_after, None);

    assert!(report.ran(Stage::ArtifactBuilt));
    assert!(!report.ran(Stage::ImageBuilt));
    assert!(!report.ran(Stage::Deployed));
    assert!(!report.ran(Stage::Committed));
}

/// The gate is case-sensitive: "Master" is not "master".
#[tokio::test]
async fn test_gate_case_sensitivity() {
    let rig = default_rig();
    let report = rig.sequencer.run(&RunContext::new("Master", 5)).await;

    assert_eq!(report.outcome, PipelineOutcome::Succeeded);
    assert!(!report.gated_in);
    assert_eq!(rig.publisher.build_calls(), 0);
}

/// A push failure halts the run before deploy and commit.
#[tokio::test]
async fn test_push_failure_halts_run() {
    let rig = rig_with(
        MemoryVersionStore::new(Version::new(1, 0, 0)),
        FakeBuilder::new(),
        FakePublisher::failing_push(),
        FakeDeployer::new(),
        FakeCommitter::new(),
    );
    let report = rig.sequencer.run(&RunContext::new("master", 7)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, cause } => {
            assert_eq!(*stage, Stage::ImageBuilt);
            assert!(cause.contains("push denied"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    assert_eq!(rig.publisher.push_calls(), 1);
    assert_eq!(rig.deployer.calls(), 0);
    assert_eq!(rig.committer.calls(), 0);
    assert_eq!(rig.store.write_count(), 0);
}

/// A deploy failure leaves the persisted version untouched.
#[tokio::test]
async fn test_deploy_failure_does_not_persist_version() {
    let rig = rig_with(
        MemoryVersionStore::new(Version::new(2, 1, 9)),
        FakeBuilder::new(),
        FakePublisher::new(),
        FakeDeployer::failing(),
        FakeCommitter::new(),
    );
    let report = rig.sequencer.run(&RunContext::new("master", 50)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, Stage::Deployed),
        other => panic!("expected Failed, got {other:?}"),
    }

    // First apply fails, second is never attempted.
    assert_eq!(rig.deployer.calls(), 1);
    assert_eq!(rig.committer.calls(), 0);
    assert_eq!(rig.store.write_count(), 0);
    assert_eq!(report.version_after, None);
    // Re-runs still see the old version.
    assert_eq!(rig.store.read().await.unwrap(), Version::new(2, 1, 9));
}

/// The version write precedes the commit: a failed commit still leaves the
/// descriptor bumped (the commit stage exists to publish that exact change).
#[tokio::test]
async fn test_commit_failure_after_version_write() {
    let rig = rig_with(
        MemoryVersionStore::new(Version::new(1, 0, 0)),
        FakeBuilder::new(),
        FakePublisher::new(),
        FakeDeployer::new(),
        FakeCommitter::failing(),
    );
    let report = rig.sequencer.run(&RunContext::new("master", 8)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, Stage::Committed),
        other => panic!("expected Failed, got {other:?}"),
    }

    assert_eq!(rig.store.writes(), vec![Version::new(1, 0, 1)]);
    assert_eq!(rig.committer.calls(), 1);
    assert_eq!(report.version_after, Some(Version::new(1, 0, 1)));
}

/// A store write failure is attributed to the commit stage and skips the
/// commit itself.
#[tokio::test]
async fn test_store_write_failure_skips_commit() {
    let rig = rig_with(
        MemoryVersionStore::failing_write(Version::new(1, 0, 0)),
        FakeBuilder::new(),
        FakePublisher::new(),
        FakeDeployer::new(),
        FakeCommitter::new(),
    );
    let report = rig.sequencer.run(&RunContext::new("master", 8)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, Stage::Committed),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(rig.committer.calls(), 0);
    assert_eq!(report.version_after, None);
}

/// An unreadable descriptor aborts before any collaborator is touched.
#[tokio::test]
async fn test_unreadable_descriptor_aborts_immediately() {
    let rig = rig_with(
        MemoryVersionStore::failing_read(Version::new(1, 0, 0)),
        FakeBuilder::new(),
        FakePublisher::new(),
        FakeDeployer::new(),
        FakeCommitter::new(),
    );
    let report = rig.sequencer.run(&RunContext::new("master", 3)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, Stage::VersionBumped),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(rig.builder.calls(), 0);
    assert!(report.identifier.is_none());
    assert!(report.stages.is_empty());
}

/// A non-positive run counter is rejected before any side effect.
#[tokio::test]
async fn test_non_positive_run_counter_rejected() {
    let rig = default_rig();
    let report = rig.sequencer.run(&RunContext::new("master", 0)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, cause } => {
            assert_eq!(*stage, Stage::VersionBumped);
            assert!(cause.contains("run counter"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(rig.builder.calls(), 0);
    assert_eq!(rig.store.write_count(), 0);
}

/// An artifact build failure halts the run on any branch.
#[tokio::test]
async fn test_artifact_build_failure_halts_run() {
    let rig = rig_with(
        MemoryVersionStore::new(Version::new(1, 0, 0)),
        FakeBuilder::failing(),
        FakePublisher::new(),
        FakeDeployer::new(),
        FakeCommitter::new(),
    );
    let report = rig.sequencer.run(&RunContext::new("feature/x", 9)).await;

    match &report.outcome {
        PipelineOutcome::Failed { stage, .. } => assert_eq!(*stage, Stage::ArtifactBuilt),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(rig.publisher.build_calls(), 0);
    assert_eq!(rig.store.write_count(), 0);
}

/// The identifier passed to the image build is the one the run computed.
#[tokio::test]
async fn test_publisher_receives_run_identifier() {
    let rig = default_rig();
    let report = rig.sequencer.run(&RunContext::new("master", 456)).await;

    assert_eq!(report.outcome, PipelineOutcome::Succeeded);
    let tags = rig.publisher.built_tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].as_str(), "1.0.1-456");
}

/// Reports serialize to JSON for the CLI's --json output.
#[tokio::test]
async fn test_report_serializes_to_json() {
    let rig = default_rig();
    let report = rig.sequencer.run(&RunContext::new("master", 11)).await;

    let json = serde_json::to_string(&report).expect("serialize report");
    assert!(json.contains("\"state\":\"succeeded\""));
    assert!(json.contains("1.0.1-11"));
}
