//! fleetconf core library: document model, repository types, local templates.
//!
//! - [`workflow`] / [`dependabot`]: typed models of the two mergeable file kinds
//! - [`document`]: [`Document`] sum type and YAML/JSON conversion
//! - [`schema`]: structural checks for rendered templates
//! - [`store`]: discovery of `.fleetconf/` templates
//! - [`config`]: run configuration
//! - [`types`]: repository identity, branch plan and update records

pub mod config;
pub mod dependabot;
pub mod document;
pub mod error;
pub mod fields;
pub mod schema;
pub mod store;
pub mod types;
pub mod workflow;

pub use config::RunConfig;
pub use dependabot::Dependabot;
pub use document::{Document, DocumentKind};
pub use error::{ConfigError, DocumentError, RepositoryIdError, StoreError};
pub use fields::{Count, Flag, ScalarSet, StringMap, StringSet};
pub use store::TemplateStore;
pub use types::{BranchPlan, RepositoryFileUpdate, RepositoryId, RepositoryInfo, RepositoryUpdate};
pub use workflow::Workflow;
