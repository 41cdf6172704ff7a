//! Per-repository reconciliation: render, fetch, merge or patch, compare.
//!
//! Files are processed in a fixed order: workflow templates, patches, health
//! files, then the dependabot template. A file that fails to render, parse or
//! patch is logged and skipped; a provider failure ends the repository.

use std::sync::Arc;

use fleetconf_core::store::{
    file_stem, remote_config_path, remote_workflow_path, PatchTarget, PatchTemplate, Template,
    REMOTE_CONFIG_DIR, WORKFLOWS_DIR,
};
use fleetconf_core::{
    BranchPlan, Document, DocumentError, DocumentKind, RepositoryFileUpdate, RepositoryId,
    RepositoryInfo, RepositoryUpdate, RunConfig, TemplateStore,
};
use fleetconf_merge::{apply_patch, PatchError};
use fleetconf_renderer::{RenderError, TemplateEngine, TemplateVars};

use crate::error::{FileError, ProviderError, SyncError};
use crate::provider::{CallGuard, EntryKind, Provider, RemoteEntry, RemoteFile};

const DEPENDABOT_REMOTE_NAMES: &[&str] = &["dependabot.yml", "dependabot.yaml"];

/// Shared, read-only inputs for reconciling any repository.
#[derive(Clone)]
pub struct Pipeline {
    provider: Arc<dyn Provider>,
    engine: Arc<TemplateEngine>,
    store: Arc<TemplateStore>,
    config: Arc<RunConfig>,
    guard: CallGuard,
}

// ---------------------------------------------------------------------------
// File-level failure plumbing
// ---------------------------------------------------------------------------

enum Failure {
    File(FileError),
    Provider(ProviderError),
}

impl From<ProviderError> for Failure {
    fn from(e: ProviderError) -> Self {
        Failure::Provider(e)
    }
}

impl From<FileError> for Failure {
    fn from(e: FileError) -> Self {
        Failure::File(e)
    }
}

impl From<RenderError> for Failure {
    fn from(e: RenderError) -> Self {
        Failure::File(e.into())
    }
}

impl From<DocumentError> for Failure {
    fn from(e: DocumentError) -> Self {
        Failure::File(e.into())
    }
}

impl From<PatchError> for Failure {
    fn from(e: PatchError) -> Self {
        Failure::File(e.into())
    }
}

/// Per-repository state while files are being reconciled.
struct Session<'a> {
    repo: &'a RepositoryId,
    git_ref: &'a str,
    vars: TemplateVars,
    /// `.github/workflows/` listing; empty when the directory does not exist.
    workflows: Vec<RemoteEntry>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        engine: Arc<TemplateEngine>,
        store: Arc<TemplateStore>,
        config: Arc<RunConfig>,
        guard: CallGuard,
    ) -> Self {
        Self {
            provider,
            engine,
            store,
            config,
            guard,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn guard(&self) -> &CallGuard {
        &self.guard
    }

    /// Reconcile every template against `repo`. Remote content is read from
    /// the plan's base branch.
    pub async fn prepare(
        &self,
        repo: RepositoryInfo,
        plan: BranchPlan,
    ) -> Result<RepositoryUpdate, SyncError> {
        let mut update = RepositoryUpdate::new(repo, plan);
        let id = update.repo.id.clone();
        let git_ref = update.plan.base.clone();

        let workflow_dir = format!("{REMOTE_CONFIG_DIR}/{WORKFLOWS_DIR}");
        let workflows = self
            .guard
            .run(
                "list_directory",
                self.provider.list_directory(&id, &workflow_dir, &git_ref),
            )
            .await?
            .unwrap_or_default()
            .into_iter()
            .filter(|e| e.kind == EntryKind::File)
            .collect();

        let session = Session {
            repo: &id,
            git_ref: &git_ref,
            vars: TemplateVars::for_repository(&update.repo, &git_ref, &self.config.vars),
            workflows,
        };

        let mut attempted = 0usize;
        let mut failed = 0usize;

        for template in &self.store.workflows {
            attempted += 1;
            let result = self.reconcile_workflow(&session, template).await;
            record(&session, &template.name, result, &mut update.files, &mut failed)?;
        }

        for patch in &self.store.patches {
            attempted += 1;
            let result = self.reconcile_patch(&session, patch, &update.files).await;
            if let Ok(Some(patched)) = &result {
                update.files.retain(|f| f.path != patched.path);
            }
            record(&session, &patch.name, result, &mut update.files, &mut failed)?;
        }

        for template in &self.store.health {
            attempted += 1;
            let result = self.reconcile_health(&session, template).await;
            record(&session, &template.name, result, &mut update.files, &mut failed)?;
        }

        if let Some(template) = &self.store.dependabot {
            attempted += 1;
            let result = self.reconcile_dependabot(&session, template).await;
            record(&session, &template.name, result, &mut update.files, &mut failed)?;
        }

        if attempted > 0 && failed == attempted {
            return Err(SyncError::AllFilesFailed {
                repo: id,
                count: attempted,
            });
        }

        tracing::debug!(
            repo = %id,
            files = update.files.len(),
            changed = update.changed_files().count(),
            "prepared"
        );
        Ok(update)
    }

    // -----------------------------------------------------------------------
    // Per-kind reconciliation
    // -----------------------------------------------------------------------

    async fn reconcile_workflow(
        &self,
        session: &Session<'_>,
        template: &Template,
    ) -> Result<Option<RepositoryFileUpdate>, Failure> {
        let rendered = self.engine.render(&template.name, &template.source, &session.vars)?;
        let local = Document::parse_validated(DocumentKind::Workflow, &template.name, &rendered)?;

        let (path, display_name) = match find_workflow(&session.workflows, template.stem()) {
            Some(entry) => (entry.path.clone(), entry.name.clone()),
            None => (remote_workflow_path(&template.name), template.name.clone()),
        };
        let remote = if session.workflows.iter().any(|e| e.path == path) {
            self.fetch(session, &path).await?
        } else {
            None
        };
        Ok(Some(merged_update(path, display_name, rendered, local, remote)?))
    }

    async fn reconcile_patch(
        &self,
        session: &Session<'_>,
        patch: &PatchTemplate,
        staged: &[RepositoryFileUpdate],
    ) -> Result<Option<RepositoryFileUpdate>, Failure> {
        let rendered = self.engine.render(&patch.name, &patch.source, &session.vars)?;

        let (kind, remote) = match &patch.target {
            PatchTarget::Workflow(name) => {
                let remote = match find_workflow(&session.workflows, file_stem(name)) {
                    Some(entry) => {
                        let path = entry.path.clone();
                        self.fetch(session, &path).await?
                    }
                    None => None,
                };
                (DocumentKind::Workflow, remote)
            }
            PatchTarget::Dependabot => (DocumentKind::Dependabot, self.fetch_dependabot(session).await?),
        };

        let Some(remote) = remote else {
            tracing::warn!(
                repo = %session.repo,
                file = %patch.name,
                "patch target does not exist remotely, skipping"
            );
            return Ok(None);
        };

        // An earlier patch on the same file is the starting point.
        let base = staged
            .iter()
            .find(|f| f.path == remote.path)
            .map(|f| f.content.as_str())
            .unwrap_or(&remote.content);

        let display_name = display_name(&remote.path);
        let original = Document::parse(kind, &display_name, &remote.content)?;
        let patched = apply_patch(kind, &display_name, base, &rendered)?;
        let changed = patched != original;
        let content = if changed {
            patched.to_yaml()?
        } else {
            remote.content.clone()
        };
        tracing::debug!(repo = %session.repo, file = %remote.path, changed, "patched");

        Ok(Some(RepositoryFileUpdate {
            display_name,
            document: Some(patched),
            content,
            sha: Some(remote.sha),
            previous: Some(remote.content),
            changed,
            commit_url: None,
            path: remote.path,
        }))
    }

    async fn reconcile_health(
        &self,
        session: &Session<'_>,
        template: &Template,
    ) -> Result<Option<RepositoryFileUpdate>, Failure> {
        let rendered = self.engine.render(&template.name, &template.source, &session.vars)?;
        let path = remote_config_path(&template.name);
        let remote = self.fetch(session, &path).await?;
        let changed = remote.as_ref().map_or(true, |r| r.content != rendered);
        tracing::debug!(repo = %session.repo, file = %path, changed, "health file");

        Ok(Some(RepositoryFileUpdate {
            path,
            display_name: template.name.clone(),
            document: None,
            content: rendered,
            sha: remote.as_ref().map(|r| r.sha.clone()),
            previous: remote.map(|r| r.content),
            changed,
            commit_url: None,
        }))
    }

    async fn reconcile_dependabot(
        &self,
        session: &Session<'_>,
        template: &Template,
    ) -> Result<Option<RepositoryFileUpdate>, Failure> {
        let rendered = self.engine.render(&template.name, &template.source, &session.vars)?;
        let local = Document::parse_validated(DocumentKind::Dependabot, &template.name, &rendered)?;
        let remote = self.fetch_dependabot(session).await?;
        let path = remote
            .as_ref()
            .map(|r| r.path.clone())
            .unwrap_or_else(|| remote_config_path(&template.name));
        let display_name = display_name(&path);
        Ok(Some(merged_update(path, display_name, rendered, local, remote)?))
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    async fn fetch(
        &self,
        session: &Session<'_>,
        path: &str,
    ) -> Result<Option<RemoteFile>, ProviderError> {
        let file = self
            .guard
            .run("get_file", self.provider.get_file(session.repo, path, session.git_ref))
            .await?;
        if file.is_none() {
            tracing::debug!(repo = %session.repo, file = %path, "not present remotely");
        }
        Ok(file)
    }

    /// Whichever of `dependabot.yml` / `dependabot.yaml` exists remotely.
    async fn fetch_dependabot(
        &self,
        session: &Session<'_>,
    ) -> Result<Option<RemoteFile>, ProviderError> {
        for name in DEPENDABOT_REMOTE_NAMES {
            if let Some(file) = self.fetch(session, &remote_config_path(name)).await? {
                return Ok(Some(file));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Remote workflows are matched on file stem, so `ci.yml` updates `ci.yaml`.
fn find_workflow<'e>(entries: &'e [RemoteEntry], stem: &str) -> Option<&'e RemoteEntry> {
    entries.iter().find(|e| {
        (e.name.ends_with(".yml") || e.name.ends_with(".yaml")) && file_stem(&e.name) == stem
    })
}

fn display_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Merge `local` into the remote file when one exists; otherwise the
/// rendered text is used verbatim.
fn merged_update(
    path: String,
    display_name: String,
    rendered: String,
    local: Document,
    remote: Option<RemoteFile>,
) -> Result<RepositoryFileUpdate, DocumentError> {
    let Some(remote) = remote else {
        return Ok(RepositoryFileUpdate {
            path,
            display_name,
            document: Some(local),
            content: rendered,
            sha: None,
            previous: None,
            changed: true,
            commit_url: None,
        });
    };

    // An empty remote file has nothing to contribute.
    if remote.content.trim().is_empty() {
        return Ok(RepositoryFileUpdate {
            path,
            display_name,
            document: Some(local),
            content: rendered,
            sha: Some(remote.sha),
            previous: Some(remote.content),
            changed: true,
            commit_url: None,
        });
    }

    let remote_doc = Document::parse(local.kind(), &display_name, &remote.content)?;
    let merged = fleetconf_merge::merge(&remote_doc, &local);
    let changed = merged != remote_doc;
    let content = if changed {
        merged.to_yaml()?
    } else {
        remote.content.clone()
    };
    tracing::debug!(file = %path, changed, "merged");

    Ok(RepositoryFileUpdate {
        path,
        display_name,
        document: Some(merged),
        content,
        sha: Some(remote.sha),
        previous: Some(remote.content),
        changed,
        commit_url: None,
    })
}

/// Fold one file's outcome into the update. Provider failures propagate.
fn record(
    session: &Session<'_>,
    name: &str,
    result: Result<Option<RepositoryFileUpdate>, Failure>,
    files: &mut Vec<RepositoryFileUpdate>,
    failed: &mut usize,
) -> Result<(), SyncError> {
    match result {
        Ok(Some(file)) => files.push(file),
        Ok(None) => {}
        Err(Failure::File(e)) => {
            *failed += 1;
            tracing::warn!(repo = %session.repo, file = %name, error = %e, "skipping file");
        }
        Err(Failure::Provider(e)) => return Err(e.into()),
    }
    Ok(())
}
