//! # fleetconf-sync
//!
//! Provider seam, per-repository reconciliation and the fleet orchestrator.
//!
//! Resolve repositories with [`select_repositories`], build a [`Pipeline`]
//! from the shared inputs, then hand both to an [`Orchestrator`]. The
//! resulting [`RunReport`] lists every selected repository.

pub mod diff;
pub mod error;
pub mod github;
pub mod ids;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod select;
pub mod validate;
pub mod writer;

pub use error::{FileError, ProviderError, SyncError};
pub use github::GitHubProvider;
pub use ids::{BranchIdGenerator, RandomIds};
pub use orchestrator::{Orchestrator, Outcome, RepositoryReport, RunOptions, RunReport, Stage};
pub use pipeline::Pipeline;
pub use provider::{CallGuard, Provider};
pub use select::{select_repositories, Selection};
pub use validate::{validate_store, ValidationResult};
pub use writer::write_update;
