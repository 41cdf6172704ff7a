#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use fleetconf_core::store::{PatchTarget, PatchTemplate, Template};
use fleetconf_core::{RepositoryId, RepositoryInfo, RunConfig, TemplateStore};
use fleetconf_renderer::TemplateEngine;
use fleetconf_sync::provider::{
    EntryKind, GitRef, NewPullRequest, PutFile, RemoteEntry, RemoteFile, SearchPage,
};
use fleetconf_sync::{BranchIdGenerator, CallGuard, Pipeline, Provider, ProviderError};

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    repos: BTreeMap<RepositoryId, RepositoryInfo>,
    /// (repo, branch, path) -> (content, sha)
    files: BTreeMap<(RepositoryId, String, String), (String, String)>,
    refs: BTreeMap<(RepositoryId, String), String>,
    failing: BTreeSet<RepositoryId>,
    puts: Vec<(RepositoryId, PutFile)>,
    created_refs: Vec<(RepositoryId, String, String)>,
    pulls: Vec<(RepositoryId, NewPullRequest)>,
    next: u64,
    latency: Duration,
    /// Cancel the token once this many files have been written.
    cancel_after_puts: Option<(usize, CancellationToken)>,
}

pub struct FakeProvider {
    login: String,
    state: Mutex<State>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Counts one repository-scoped call for as long as it is alive.
struct Call<'a>(&'a AtomicUsize);

impl Drop for Call<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeProvider {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            state: Mutex::new(State::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every file read, listing and write takes at least `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().latency = latency;
        self
    }

    pub fn cancel_after_puts(&self, puts: usize, token: CancellationToken) {
        self.state.lock().unwrap().cancel_after_puts = Some((puts, token));
    }

    /// The most repository-scoped calls that were ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Call<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let call = Call(&self.in_flight);
        let latency = self.state.lock().unwrap().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        call
    }

    pub fn add_repo(&self, full_name: &str) -> RepositoryInfo {
        let id: RepositoryId = full_name.parse().unwrap();
        let info = RepositoryInfo::synthetic(id.clone());
        self.state.lock().unwrap().repos.insert(id, info.clone());
        info
    }

    pub fn add_ref(&self, repo: &RepositoryInfo, name: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .refs
            .insert((repo.id.clone(), name.to_string()), sha.to_string());
    }

    pub fn add_file(&self, repo: &RepositoryInfo, branch: &str, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.next += 1;
        let sha = format!("sha{}", state.next);
        state.files.insert(
            (repo.id.clone(), branch.to_string(), path.to_string()),
            (content.to_string(), sha),
        );
    }

    /// Every call touching `repo` fails with HTTP 500.
    pub fn fail_repo(&self, repo: &RepositoryInfo) {
        self.state.lock().unwrap().failing.insert(repo.id.clone());
    }

    pub fn puts(&self) -> Vec<(RepositoryId, PutFile)> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn created_refs(&self) -> Vec<(RepositoryId, String, String)> {
        self.state.lock().unwrap().created_refs.clone()
    }

    pub fn pulls(&self) -> Vec<(RepositoryId, NewPullRequest)> {
        self.state.lock().unwrap().pulls.clone()
    }

    pub fn file(&self, repo: &RepositoryInfo, branch: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(repo.id.clone(), branch.to_string(), path.to_string()))
            .map(|(content, _)| content.clone())
    }

    fn check(&self, repo: &RepositoryId, operation: &'static str) -> Result<(), ProviderError> {
        if self.state.lock().unwrap().failing.contains(repo) {
            return Err(ProviderError::Status {
                operation,
                status: 500,
                message: "server error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn current_login(&self) -> Result<String, ProviderError> {
        Ok(self.login.clone())
    }

    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, ProviderError> {
        let state = self.state.lock().unwrap();
        let matches: Vec<RepositoryInfo> = state
            .repos
            .values()
            .filter(|r| match query.strip_prefix("user:") {
                Some(login) => r.id.owner == login,
                None => r.id.name.contains(query.trim_end_matches(" in:name")),
            })
            .cloned()
            .collect();
        let start = (page as usize - 1) * per_page as usize;
        Ok(SearchPage {
            total_count: matches.len() as u64,
            items: matches.into_iter().skip(start).take(per_page as usize).collect(),
        })
    }

    async fn get_repository(&self, repo: &RepositoryId) -> Result<RepositoryInfo, ProviderError> {
        self.check(repo, "get_repository")?;
        self.state
            .lock()
            .unwrap()
            .repos
            .get(repo)
            .cloned()
            .ok_or(ProviderError::Status {
                operation: "get_repository",
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn list_directory(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<RemoteEntry>>, ProviderError> {
        self.check(repo, "list_directory")?;
        let _call = self.enter().await;
        let prefix = format!("{path}/");
        let state = self.state.lock().unwrap();
        let entries: Vec<RemoteEntry> = state
            .files
            .iter()
            .filter(|((r, b, p), _)| r == repo && b == git_ref && p.starts_with(&prefix))
            .filter(|((_, _, p), _)| !p[prefix.len()..].contains('/'))
            .map(|((_, _, p), (_, sha))| RemoteEntry {
                name: p[prefix.len()..].to_string(),
                path: p.clone(),
                sha: sha.clone(),
                kind: EntryKind::File,
            })
            .collect();
        Ok((!entries.is_empty()).then_some(entries))
    }

    async fn get_file(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RemoteFile>, ProviderError> {
        self.check(repo, "get_file")?;
        let _call = self.enter().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .get(&(repo.clone(), git_ref.to_string(), path.to_string()))
            .map(|(content, sha)| RemoteFile {
                path: path.to_string(),
                sha: sha.clone(),
                content: content.clone(),
            }))
    }

    async fn put_file(&self, repo: &RepositoryId, file: &PutFile) -> Result<String, ProviderError> {
        self.check(repo, "put_file")?;
        let _call = self.enter().await;
        let mut state = self.state.lock().unwrap();
        state.next += 1;
        let n = state.next;
        state.files.insert(
            (repo.clone(), file.branch.clone(), file.path.clone()),
            (file.content.clone(), format!("sha{n}")),
        );
        state.puts.push((repo.clone(), file.clone()));
        if let Some((after, token)) = &state.cancel_after_puts {
            if state.puts.len() >= *after {
                token.cancel();
            }
        }
        Ok(format!("https://example.test/{repo}/commit/{n}"))
    }

    async fn list_matching_refs(
        &self,
        repo: &RepositoryId,
        prefix: &str,
    ) -> Result<Vec<GitRef>, ProviderError> {
        self.check(repo, "list_matching_refs")?;
        let wanted = format!("refs/{prefix}");
        let state = self.state.lock().unwrap();
        Ok(state
            .refs
            .iter()
            .filter(|((r, name), _)| r == repo && name.starts_with(&wanted))
            .map(|((_, name), sha)| GitRef {
                name: name.clone(),
                sha: sha.clone(),
            })
            .collect())
    }

    async fn create_ref(
        &self,
        repo: &RepositoryId,
        name: &str,
        sha: &str,
    ) -> Result<(), ProviderError> {
        self.check(repo, "create_ref")?;
        let mut state = self.state.lock().unwrap();
        state.refs.insert((repo.clone(), name.to_string()), sha.to_string());
        state
            .created_refs
            .push((repo.clone(), name.to_string(), sha.to_string()));
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pr: &NewPullRequest,
    ) -> Result<String, ProviderError> {
        self.check(repo, "create_pull_request")?;
        let mut state = self.state.lock().unwrap();
        state.pulls.push((repo.clone(), pr.clone()));
        Ok(format!("https://example.test/{repo}/pull/{}", state.pulls.len()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct FixedIds(pub &'static str);

impl BranchIdGenerator for FixedIds {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

pub const CI_TEMPLATE: &str = "\
name: CI
on:
  push:
    branches: [master]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - name: Checkout
        uses: actions/checkout@v4
      - name: Test
        run: make test
";

pub const CI_REMOTE: &str = "\
name: Old CI
on:
  push:
    branches: [master]
jobs:
  build:
    runs-on: ubuntu-20.04
    timeout-minutes: 10
    steps:
      - name: Checkout
        uses: actions/checkout@v4
  docs:
    runs-on: ubuntu-latest
    steps:
      - run: make docs
";

pub fn template(name: &str, source: &str) -> Template {
    Template {
        name: name.to_string(),
        path: PathBuf::from(format!(".fleetconf/{name}")),
        source: source.to_string(),
    }
}

pub fn patch(name: &str, target: PatchTarget, source: &str) -> PatchTemplate {
    PatchTemplate {
        name: name.to_string(),
        path: PathBuf::from(format!(".fleetconf/patches/{name}")),
        target,
        source: source.to_string(),
    }
}

pub fn ci_store() -> TemplateStore {
    TemplateStore {
        workflows: vec![template("ci.yml", CI_TEMPLATE)],
        ..TemplateStore::default()
    }
}

pub fn direct_config() -> RunConfig {
    RunConfig {
        create_pr: false,
        ..RunConfig::default()
    }
}

pub fn guard() -> CallGuard {
    CallGuard::new(CancellationToken::new(), Duration::from_secs(5))
}

pub fn pipeline(provider: &Arc<FakeProvider>, store: TemplateStore, config: RunConfig) -> Pipeline {
    pipeline_with_guard(provider, store, config, guard())
}

pub fn pipeline_with_guard(
    provider: &Arc<FakeProvider>,
    store: TemplateStore,
    config: RunConfig,
    guard: CallGuard,
) -> Pipeline {
    Pipeline::new(
        provider.clone(),
        Arc::new(TemplateEngine::new().unwrap()),
        Arc::new(store),
        Arc::new(config),
        guard,
    )
}
