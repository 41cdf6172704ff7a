//! Error types for fleetconf-sync.
//!
//! Three levels, matching how far a failure reaches:
//!
//! - [`FileError`]: one file of one repository is skipped.
//! - [`ProviderError`]: a provider call failed; the repository is marked failed.
//! - [`SyncError`]: a repository (or, for selection, the whole run) cannot proceed.

use std::path::PathBuf;

use thiserror::Error;

use fleetconf_core::{DocumentError, RepositoryId};
use fleetconf_merge::PatchError;
use fleetconf_renderer::RenderError;

/// A failed call to the source-control provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API answered with a non-success status other than a handled 404.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The request never produced an API answer.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The answer could not be used (bad base64, missing fields, ...).
    #[error("{operation} returned unusable data: {message}")]
    Decode { operation: &'static str, message: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("could not build API client: {0}")]
    Client(String),
}

/// A failure confined to one file; the pipeline logs it and moves on.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Repository-level and run-level errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Pull-request mode needs the exact base ref; nothing has been written.
    #[error("{repo}: base branch '{base}' not found")]
    BaseRefNotFound { repo: RepositoryId, base: String },

    /// Every file of the repository failed to reconcile.
    #[error("{repo}: all {count} files failed to reconcile")]
    AllFilesFailed { repo: RepositoryId, count: usize },

    /// A worker task ended without reporting (panic or abort).
    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
