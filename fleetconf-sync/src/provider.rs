//! The source-control provider seam.
//!
//! Everything the pipeline and the writer need from the remote side goes
//! through [`Provider`]. A missing file or directory is `Ok(None)`, never an
//! error. [`CallGuard`] bounds every call with a timeout and a shared
//! cancellation token.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use fleetconf_core::{RepositoryId, RepositoryInfo};

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// Wire-independent types
// ---------------------------------------------------------------------------

/// One page of a repository search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Matches across all pages.
    pub total_count: u64,
    pub items: Vec<RepositoryInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    pub sha: String,
    pub kind: EntryKind,
}

/// Decoded file content plus the blob SHA needed to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
    pub content: String,
}

/// Create-or-update request for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    pub path: String,
    pub content: String,
    pub message: String,
    pub branch: String,
    /// Previous blob SHA; `None` creates the file.
    pub sha: Option<String>,
}

/// A git reference such as `refs/heads/main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Provider: Send + Sync {
    /// Login of the authenticated account.
    async fn current_login(&self) -> Result<String, ProviderError>;

    /// `page` is 1-based.
    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, ProviderError>;

    async fn get_repository(&self, repo: &RepositoryId) -> Result<RepositoryInfo, ProviderError>;

    async fn list_directory(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<RemoteEntry>>, ProviderError>;

    async fn get_file(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RemoteFile>, ProviderError>;

    /// Returns the commit URL.
    async fn put_file(&self, repo: &RepositoryId, file: &PutFile) -> Result<String, ProviderError>;

    /// Refs whose name starts with `refs/<prefix>`, e.g. `heads/main`.
    async fn list_matching_refs(
        &self,
        repo: &RepositoryId,
        prefix: &str,
    ) -> Result<Vec<GitRef>, ProviderError>;

    async fn create_ref(
        &self,
        repo: &RepositoryId,
        name: &str,
        sha: &str,
    ) -> Result<(), ProviderError>;

    /// Returns the pull request URL.
    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pr: &NewPullRequest,
    ) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// Call guard
// ---------------------------------------------------------------------------

/// Per-call timeout and run-wide cancellation.
#[derive(Debug, Clone)]
pub struct CallGuard {
    cancel: CancellationToken,
    timeout: Duration,
}

impl CallGuard {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await `call`, failing with `Cancelled` or `Timeout` as appropriate.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ProviderError::Cancelled { operation });
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProviderError::Cancelled { operation }),
            res = tokio::time::timeout(self.timeout, call) => match res {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::Timeout { operation, secs: self.timeout.as_secs() }),
            },
        }
    }
}
