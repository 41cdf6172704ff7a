//! Local template store.
//!
//! # Layout
//!
//! ```text
//! <root>/.fleetconf/
//!   config.yaml             (optional run configuration)
//!   workflows/*.yml|*.yaml  (workflow templates, merged into .github/workflows/)
//!   patches/*.yml|*.yaml    (patch specs applied to existing remote files)
//!   dependabot.yml|.yaml    (optional, merged into .github/dependabot.yml)
//!   CODE_OF_CONDUCT.md ...  (health files, rendered and written to .github/)
//! ```
//!
//! Templates are read as raw text; rendering happens per repository.
//! Discovery order is sorted by file name so runs are reproducible.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StoreError;

pub const STORE_DIR: &str = ".fleetconf";
pub const WORKFLOWS_DIR: &str = "workflows";
pub const PATCHES_DIR: &str = "patches";
pub const REMOTE_CONFIG_DIR: &str = ".github";

/// Community health files synced verbatim (after rendering) into `.github/`.
pub const HEALTH_FILES: &[&str] = &[
    "CODE_OF_CONDUCT.md",
    "CONTRIBUTING.md",
    "FUNDING.yml",
    "SECURITY.md",
    "SUPPORT.md",
];

const DEPENDABOT_NAMES: &[&str] = &["dependabot.yml", "dependabot.yaml"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A raw template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// File name, e.g. `ci.yml`.
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

impl Template {
    /// File name without extension; remote workflows are matched on it.
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }
}

/// The remote file a patch applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchTarget {
    /// A workflow, by file name.
    Workflow(String),
    Dependabot,
}

impl PatchTarget {
    fn from_filename(filename: &str) -> Self {
        let name = filename.trim().trim_start_matches("workflows/");
        if DEPENDABOT_NAMES.contains(&name) {
            PatchTarget::Dependabot
        } else {
            PatchTarget::Workflow(name.to_string())
        }
    }
}

/// A patch spec file. The op list is rendered and decoded per repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTemplate {
    pub name: String,
    pub path: PathBuf,
    pub target: PatchTarget,
    pub source: String,
}

#[derive(Deserialize)]
struct PatchHeader {
    filename: String,
}

/// Everything discovered under `.fleetconf/`.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    pub workflows: Vec<Template>,
    pub patches: Vec<PatchTemplate>,
    pub dependabot: Option<Template>,
    pub health: Vec<Template>,
}

impl TemplateStore {
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
            && self.patches.is_empty()
            && self.dependabot.is_none()
            && self.health.is_empty()
    }

    /// Number of files a repository can receive per run.
    pub fn len(&self) -> usize {
        self.workflows.len() + self.patches.len() + self.health.len() + usize::from(self.dependabot.is_some())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<root>/.fleetconf/`
pub fn store_dir_at(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

/// `.github/workflows/<name>`
pub fn remote_workflow_path(name: &str) -> String {
    format!("{REMOTE_CONFIG_DIR}/{WORKFLOWS_DIR}/{name}")
}

/// `.github/<name>`
pub fn remote_config_path(name: &str) -> String {
    format!("{REMOTE_CONFIG_DIR}/{name}")
}

pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn is_yaml(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io { path: path.into(), source }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Discover every template under `<root>/.fleetconf/`.
///
/// Returns `StoreError::NotFound` if the directory is missing and
/// `StoreError::Conflict` if a patch targets a file that a template also writes.
pub fn discover_at(root: &Path) -> Result<TemplateStore, StoreError> {
    let dir = store_dir_at(root);
    if !dir.is_dir() {
        return Err(StoreError::NotFound { path: dir });
    }

    let workflows = read_templates(&dir.join(WORKFLOWS_DIR), is_yaml)?;

    let patches = read_templates(&dir.join(PATCHES_DIR), is_yaml)?
        .into_iter()
        .map(|t| {
            let header: PatchHeader = serde_yaml::from_str(&t.source)
                .map_err(|e| StoreError::Patch { path: t.path.clone(), source: e })?;
            Ok(PatchTemplate {
                target: PatchTarget::from_filename(&header.filename),
                name: t.name,
                path: t.path,
                source: t.source,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let dependabot = read_templates(&dir, |name| DEPENDABOT_NAMES.contains(&name))?
        .into_iter()
        .next();
    let health = read_templates(&dir, |name| HEALTH_FILES.contains(&name))?;

    let store = TemplateStore { workflows, patches, dependabot, health };
    check_conflicts(&store)?;

    tracing::debug!(
        workflows = store.workflows.len(),
        patches = store.patches.len(),
        health = store.health.len(),
        dependabot = store.dependabot.is_some(),
        "discovered templates in {}",
        dir.display()
    );
    Ok(store)
}

/// Read every regular file in `dir` whose name passes `accept`, sorted by name.
/// A missing directory yields nothing; empty files are skipped.
fn read_templates(dir: &Path, accept: impl Fn(&str) -> bool) -> Result<Vec<Template>, StoreError> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut templates = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !accept(&name) {
            continue;
        }
        let path = entry.path();
        let source = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        if source.trim().is_empty() {
            tracing::info!("template {} is empty, skipping", path.display());
            continue;
        }
        templates.push(Template { name, path, source });
    }
    Ok(templates)
}

fn check_conflicts(store: &TemplateStore) -> Result<(), StoreError> {
    for patch in &store.patches {
        let clash = match &patch.target {
            PatchTarget::Workflow(name) => store
                .workflows
                .iter()
                .find(|t| t.stem() == file_stem(name))
                .map(|t| (remote_workflow_path(name), t)),
            PatchTarget::Dependabot => store
                .dependabot
                .as_ref()
                .map(|t| (remote_config_path(&t.name), t)),
        };
        if let Some((target, template)) = clash {
            return Err(StoreError::Conflict {
                target,
                template: template.path.clone(),
                patch: patch.path.clone(),
            });
        }
    }
    Ok(())
}
