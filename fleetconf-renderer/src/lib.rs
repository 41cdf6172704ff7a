//! # fleetconf-renderer
//!
//! Renders `.fleetconf/` templates for one repository at a time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleetconf_core::{RepositoryId, RepositoryInfo, StringMap};
//! use fleetconf_renderer::{TemplateEngine, TemplateVars};
//!
//! fn render(source: &str) -> Result<String, fleetconf_renderer::RenderError> {
//!     let repo = RepositoryInfo::synthetic(RepositoryId::new("octo", "widgets"));
//!     let vars = TemplateVars::for_repository(&repo, "main", &StringMap::new());
//!     TemplateEngine::new()?.render("ci.yml", source, &vars)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::TemplateVars;
pub use engine::TemplateEngine;
pub use error::RenderError;
