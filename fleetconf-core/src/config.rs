//! Run configuration: built-in defaults overlaid by `.fleetconf/config.yaml`.
//!
//! CLI flags are applied on top by the binary; this module only knows about
//! the file layer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fields::StringMap;
use crate::store::store_dir_at;

pub const CONFIG_FILE: &str = "config.yaml";
pub const BRANCH_ID_PLACEHOLDER: &str = "{id}";
pub const FILE_PLACEHOLDER: &str = "{file}";
pub const MAX_CONCURRENCY: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Branch to commit to, or to cut the working branch from.
    pub base_branch: String,
    /// Open a draft pull request instead of committing to `base_branch`.
    pub create_pr: bool,
    /// Working branch name; `{id}` is replaced by a short random id.
    pub branch_pattern: String,
    /// Repositories processed at once.
    pub concurrency: usize,
    /// Upper bound for a single provider call.
    pub call_timeout_secs: u64,
    /// Search page size.
    pub per_page: u8,
    /// Per-file commit message; `{file}` is replaced by the file's display name.
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
    /// Extra template variables, available as `vars.<key>`.
    pub vars: StringMap,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_branch: "master".to_string(),
            create_pr: true,
            branch_pattern: "fleetconf/sync/{id}".to_string(),
            concurrency: 4,
            call_timeout_secs: 30,
            per_page: 100,
            commit_message: "Update {file} file by fleetconf".to_string(),
            pr_title: "Synchronize (.github) configurations by fleetconf".to_string(),
            pr_body: "This pull request was opened by fleetconf to keep the repository's \
                      CI and dependency-update configuration in line with the shared templates."
                .to_string(),
            vars: StringMap::new(),
        }
    }
}

impl RunConfig {
    /// Reject values that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_branch.trim().is_empty() {
            return Err(invalid("base_branch", "must not be empty"));
        }
        if !self.branch_pattern.contains(BRANCH_ID_PLACEHOLDER) {
            return Err(invalid(
                "branch_pattern",
                format!("must contain {BRANCH_ID_PLACEHOLDER}, got '{}'", self.branch_pattern),
            ));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(invalid(
                "concurrency",
                format!("must be between 1 and {MAX_CONCURRENCY}, got {}", self.concurrency),
            ));
        }
        if self.call_timeout_secs == 0 {
            return Err(invalid("call_timeout_secs", "must be at least 1"));
        }
        if self.per_page == 0 || self.per_page > 100 {
            return Err(invalid("per_page", format!("must be between 1 and 100, got {}", self.per_page)));
        }
        Ok(())
    }

    /// Working branch name for a generated id.
    pub fn branch_name(&self, id: &str) -> String {
        self.branch_pattern.replace(BRANCH_ID_PLACEHOLDER, id)
    }

    pub fn commit_message_for(&self, display_name: &str) -> String {
        self.commit_message.replace(FILE_PLACEHOLDER, display_name)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

/// `<root>/.fleetconf/config.yaml`
pub fn config_path_at(root: &Path) -> PathBuf {
    store_dir_at(root).join(CONFIG_FILE)
}

/// Load the file layer over the defaults. A missing file yields the defaults.
///
/// The result is not validated; call [`RunConfig::validate`] after CLI
/// overrides have been applied.
pub fn load_at(root: &Path) -> Result<RunConfig, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(RunConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io { path: path.clone(), source: e })?;
    if contents.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let cfg = load_at(root.path()).unwrap();
        assert_eq!(cfg, RunConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn file_overrides_only_given_keys() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(store_dir_at(root.path())).unwrap();
        fs::write(
            config_path_at(root.path()),
            "base_branch: main\nconcurrency: 8\nvars:\n  runner: ubuntu-22.04\n",
        )
        .unwrap();

        let cfg = load_at(root.path()).unwrap();
        assert_eq!(cfg.base_branch, "main");
        assert_eq!(cfg.concurrency, 8);
        assert!(cfg.create_pr);
        assert_eq!(cfg.vars.get("runner"), Some(&serde_yaml::Value::from("ubuntu-22.04")));
    }

    #[test]
    fn malformed_file_reports_path() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(store_dir_at(root.path())).unwrap();
        fs::write(config_path_at(root.path()), "concurrency: [1\n").unwrap();
        let err = load_at(root.path()).unwrap_err();
        assert!(err.to_string().contains("config.yaml"), "{err}");
    }

    #[rstest]
    #[case::zero_concurrency(RunConfig { concurrency: 0, ..Default::default() }, "concurrency")]
    #[case::huge_concurrency(RunConfig { concurrency: 64, ..Default::default() }, "concurrency")]
    #[case::no_placeholder(RunConfig { branch_pattern: "sync".into(), ..Default::default() }, "branch_pattern")]
    #[case::empty_base(RunConfig { base_branch: " ".into(), ..Default::default() }, "base_branch")]
    #[case::zero_timeout(RunConfig { call_timeout_secs: 0, ..Default::default() }, "call_timeout_secs")]
    fn rejects_invalid_values(#[case] cfg: RunConfig, #[case] field: &str) {
        match cfg.validate() {
            Err(ConfigError::Invalid { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected invalid {field}, got {other:?}"),
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.branch_name("x1y2"), "fleetconf/sync/x1y2");
        assert_eq!(cfg.commit_message_for("ci.yml"), "Update ci.yml file by fleetconf");
    }
}
