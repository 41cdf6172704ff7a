//! Template variables: the serializable payload every template sees.
//!
//! ```text
//! repo.owner / repo.name / repo.full_name / repo.default_branch
//! repo.description / repo.html_url / repo.private / repo.topics
//! base_branch
//! fleetconf.version
//! vars.<key>            (from .fleetconf/config.yaml)
//! ```

use serde::Serialize;

use fleetconf_core::{RepositoryInfo, StringMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateVars {
    pub repo: RepoVars,
    pub base_branch: String,
    pub fleetconf: ToolVars,
    pub vars: StringMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoVars {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
    pub description: String,
    pub html_url: String,
    pub private: bool,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolVars {
    pub version: &'static str,
}

impl TemplateVars {
    /// Variables for one repository.
    pub fn for_repository(repo: &RepositoryInfo, base_branch: &str, vars: &StringMap) -> Self {
        Self {
            repo: RepoVars {
                owner: repo.id.owner.clone(),
                name: repo.id.name.clone(),
                full_name: repo.id.to_string(),
                default_branch: repo.default_branch.clone(),
                description: repo.description.clone(),
                html_url: repo.html_url.clone(),
                private: repo.private,
                topics: repo.topics.clone(),
            },
            base_branch: base_branch.to_string(),
            fleetconf: ToolVars { version: env!("CARGO_PKG_VERSION") },
            vars: vars.clone(),
        }
    }
}
