//! Repository-level domain types shared by the pipeline, the writer and the CLI.
//!
//! None of these are persisted; they live for a single run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::RepositoryIdError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = RepositoryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(RepositoryIdError(s.to_string())),
        }
    }
}

/// Repository metadata as reported by the provider; also the `repo` template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: RepositoryId,
    pub default_branch: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl RepositoryInfo {
    /// Metadata for a repository known only by name (offline validation, tests).
    pub fn synthetic(id: RepositoryId) -> Self {
        Self {
            html_url: format!("https://github.com/{id}"),
            id,
            default_branch: "main".to_string(),
            description: String::new(),
            private: false,
            archived: false,
            topics: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// Branch plan
// ---------------------------------------------------------------------------

/// Where a repository's changes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPlan {
    /// Branch the working branch is cut from, or committed to directly.
    pub base: String,
    /// Working branch for pull-request mode; `None` commits straight to `base`.
    pub branch: Option<String>,
}

impl BranchPlan {
    pub fn direct(base: impl Into<String>) -> Self {
        Self { base: base.into(), branch: None }
    }

    pub fn pull_request(base: impl Into<String>, branch: impl Into<String>) -> Self {
        Self { base: base.into(), branch: Some(branch.into()) }
    }

    /// `refs/heads/<base>`
    pub fn base_ref(&self) -> String {
        format!("refs/heads/{}", self.base)
    }

    /// `refs/heads/<branch>` in pull-request mode.
    pub fn pr_branch_ref(&self) -> Option<String> {
        self.branch.as_ref().map(|b| format!("refs/heads/{b}"))
    }

    /// The branch commits land on.
    pub fn target_branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(&self.base)
    }
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Reconciliation result for one file of one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryFileUpdate {
    /// Repository-relative target path, e.g. `.github/workflows/ci.yml`.
    pub path: String,
    /// Short name for reports, e.g. `ci.yml`.
    pub display_name: String,
    /// The reconciled document; `None` for pass-through files.
    pub document: Option<Document>,
    /// Bytes to write.
    pub content: String,
    /// Remote blob SHA when the file already exists.
    pub sha: Option<String>,
    /// Remote content before reconciliation.
    pub previous: Option<String>,
    /// `false` when the reconciled result equals what is already there.
    pub changed: bool,
    /// Commit URL once written.
    pub commit_url: Option<String>,
}

impl RepositoryFileUpdate {
    pub fn is_new(&self) -> bool {
        self.sha.is_none()
    }
}

/// One repository's unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryUpdate {
    pub repo: RepositoryInfo,
    pub plan: BranchPlan,
    pub files: Vec<RepositoryFileUpdate>,
    pub pull_request_url: Option<String>,
}

impl RepositoryUpdate {
    pub fn new(repo: RepositoryInfo, plan: BranchPlan) -> Self {
        Self { repo, plan, files: vec![], pull_request_url: None }
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &RepositoryFileUpdate> {
        self.files.iter().filter(|f| f.changed)
    }

    pub fn has_changes(&self) -> bool {
        self.files.iter().any(|f| f.changed)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("octo/widgets", Some(("octo", "widgets")))]
    #[case(" octo/widgets ", Some(("octo", "widgets")))]
    #[case("octo", None)]
    #[case("/widgets", None)]
    #[case("octo/", None)]
    #[case("a/b/c", None)]
    fn parses_repository_ids(#[case] input: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = input.parse::<RepositoryId>().ok();
        assert_eq!(parsed, expected.map(|(o, n)| RepositoryId::new(o, n)));
    }

    #[test]
    fn branch_plan_refs() {
        let plan = BranchPlan::pull_request("main", "fleetconf/sync/abc123");
        assert_eq!(plan.base_ref(), "refs/heads/main");
        assert_eq!(plan.pr_branch_ref().as_deref(), Some("refs/heads/fleetconf/sync/abc123"));
        assert_eq!(plan.target_branch(), "fleetconf/sync/abc123");

        let direct = BranchPlan::direct("main");
        assert_eq!(direct.pr_branch_ref(), None);
        assert_eq!(direct.target_branch(), "main");
    }
}
