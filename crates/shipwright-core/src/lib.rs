//! Shipwright Core
//!
//! Domain model for the promotion pipeline:
//! - `Version`: the project's semantic version and patch arithmetic
//! - `BuildIdentifier`: the unique image tag for one pipeline run
//! - `BranchGate`: the predicate restricting side-effecting stages
//! - `RunContext`: orchestrator-supplied branch name and run counter
//! - `VersionStore`: persistence seam for the project descriptor

pub mod context;
pub mod error;
pub mod gate;
pub mod identifier;
pub mod store;
pub mod version;

pub use context::RunContext;
pub use error::{PipelineError, Result};
pub use gate::BranchGate;
pub use identifier::BuildIdentifier;
pub use store::{FileVersionStore, VersionStore};
pub use version::Version;
