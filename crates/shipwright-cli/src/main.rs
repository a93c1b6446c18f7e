//! Shipwright - promotion pipeline CLI
//!
//! The `shipwright` command drives one promotion run and exposes small
//! operator helpers around the project descriptor.
//!
//! ## Commands
//!
//! - `run`: execute a full promotion run (bump, build, gated publish/deploy/commit)
//! - `version show` / `version bump`: inspect or advance the descriptor version
//! - `tag`: print the build identifier a run with the given inputs would use

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use shipwright_core::{BranchGate, BuildIdentifier, FileVersionStore, RunContext, VersionStore};
use shipwright_pipeline::{
    init_tracing, DockerPublisher, GitCommitter, KubectlDeployer, MavenBuilder, PipelineConfig,
    PipelineOutcome, PromotionSequencer, RunReport,
};

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Promotion pipeline: version bump, artifact build, gated publish/deploy/commit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one promotion run
    Run {
        /// Pipeline configuration file
        #[arg(short, long, default_value = "pipeline.json")]
        config: PathBuf,

        /// Branch the run executes against (default: $BRANCH_NAME)
        #[arg(long)]
        branch: Option<String>,

        /// Orchestrator run counter (default: $BUILD_NUMBER)
        #[arg(long)]
        build_number: Option<i64>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or advance the descriptor version
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },

    /// Print the build identifier a run with these inputs would produce
    Tag {
        /// Project descriptor file
        #[arg(short, long, default_value = "project.json")]
        descriptor: PathBuf,

        /// Orchestrator run counter
        #[arg(long)]
        build_number: i64,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Print the current version
    Show {
        /// Project descriptor file
        #[arg(short, long, default_value = "project.json")]
        descriptor: PathBuf,
    },

    /// Increment the patch version and persist it
    Bump {
        /// Project descriptor file
        #[arg(short, long, default_value = "project.json")]
        descriptor: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Run {
            config,
            branch,
            build_number,
            json,
        } => cmd_run(&config, branch, build_number, json).await,
        Commands::Version { action } => match action {
            VersionAction::Show { descriptor } => cmd_version_show(&descriptor).await,
            VersionAction::Bump { descriptor } => cmd_version_bump(&descriptor).await,
        },
        Commands::Tag {
            descriptor,
            build_number,
        } => cmd_tag(&descriptor, build_number).await,
    }
}

/// Resolve the run context from flags, falling back to the orchestrator's
/// environment for anything not supplied explicitly.
fn resolve_context(branch: Option<String>, build_number: Option<i64>) -> Result<RunContext> {
    match (branch, build_number) {
        (Some(branch), Some(n)) => Ok(RunContext::new(branch, n)),
        (branch, n) => {
            let env = RunContext::from_env()
                .context("branch/build number not supplied and not found in environment")?;
            Ok(RunContext::new(
                branch.unwrap_or(env.branch),
                n.unwrap_or(env.run_counter),
            ))
        }
    }
}

async fn cmd_run(
    config_path: &Path,
    branch: Option<String>,
    build_number: Option<i64>,
    json: bool,
) -> Result<()> {
    let config = PipelineConfig::load(config_path).await?;
    let ctx = resolve_context(branch, build_number)?;

    let store = Arc::new(FileVersionStore::new(config.descriptor_path.clone()));
    let builder = Arc::new(MavenBuilder::new(".", config.tool_timeout_secs));
    let publisher = Arc::new(DockerPublisher::new(
        config.image_repository(),
        ".",
        config.tool_timeout_secs,
    ));
    let deployer = Arc::new(KubectlDeployer::new(config.tool_timeout_secs));
    let committer = Arc::new(GitCommitter::new(
        ".",
        config.descriptor_path.clone(),
        config.tool_timeout_secs,
    ));

    let sequencer = PromotionSequencer::new(
        store,
        builder,
        publisher,
        deployer,
        committer,
        BranchGate::new(config.target_branch.clone()),
        config.app_name.clone(),
        config.deployment_manifest.clone(),
        config.service_manifest.clone(),
        config.commit_author.clone(),
    );

    let report = sequencer.run(&ctx).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    match &report.outcome {
        PipelineOutcome::Succeeded => Ok(()),
        PipelineOutcome::Failed { stage, cause } => {
            anyhow::bail!("run failed at stage {stage}: {cause}")
        }
        other => anyhow::bail!("run ended in unexpected state: {other:?}"),
    }
}

fn print_report(report: &RunReport) {
    println!("Run:        {}", report.run_id);
    println!("Branch:     {} (gated in: {})", report.branch, report.gated_in);
    if let Some(id) = &report.identifier {
        println!("Identifier: {id}");
    }
    if let Some(before) = &report.version_before {
        match &report.version_after {
            Some(after) => println!("Version:    {before} -> {after} (persisted)"),
            None => println!("Version:    {before} (bump not persisted)"),
        }
    }
    println!("Stages:");
    for stage in &report.stages {
        println!("  {:<16} {:>6} ms", stage.stage.name(), stage.duration_ms);
    }
    match &report.outcome {
        PipelineOutcome::Succeeded => println!("Outcome:    succeeded ({} ms)", report.duration_ms),
        PipelineOutcome::Failed { stage, cause } => {
            println!("Outcome:    FAILED at {stage}: {cause}")
        }
        other => println!("Outcome:    {other:?}"),
    }
}

async fn cmd_version_show(descriptor: &Path) -> Result<()> {
    let store = FileVersionStore::new(descriptor);
    let version = store.read().await?;
    println!("{version}");
    Ok(())
}

async fn cmd_version_bump(descriptor: &Path) -> Result<()> {
    let store = FileVersionStore::new(descriptor);
    let current = store.read().await?;
    let next = current.next_patch();
    store.write(&next).await?;
    println!("{current} -> {next}");
    Ok(())
}

async fn cmd_tag(descriptor: &Path, build_number: i64) -> Result<()> {
    let store = FileVersionStore::new(descriptor);
    let next = store.read().await?.next_patch();
    let identifier = BuildIdentifier::new(&next, build_number)?;
    println!("{identifier}");
    Ok(())
}
