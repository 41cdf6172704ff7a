//! Subcommands and the plumbing they share.

pub mod repos;
pub mod sync;
pub mod validate;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use fleetconf_core::{config, RunConfig};
use fleetconf_sync::{CallGuard, GitHubProvider, Provider};

/// Credentials and endpoint for the GitHub API.
#[derive(Args, Debug)]
pub struct GitHubArgs {
    /// Personal access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root for GitHub Enterprise, e.g. `https://ghe.example.com/api/v3`.
    #[arg(long, env = "FLEETCONF_API_URL")]
    pub api_url: Option<String>,
}

impl GitHubArgs {
    pub fn provider(&self) -> Result<Arc<dyn Provider>> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .context("no GitHub token; pass --token or set GITHUB_TOKEN")?;
        let provider = GitHubProvider::new(token, self.api_url.as_deref())
            .context("failed to create GitHub client")?;
        Ok(Arc::new(provider))
    }
}

/// `<dir>/.fleetconf/config.yaml` over the built-in defaults.
pub fn load_config(dir: &Path) -> Result<RunConfig> {
    config::load_at(dir).with_context(|| {
        format!("failed to load {}", config::config_path_at(dir).display())
    })
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// A guard whose token is cancelled on Ctrl-C.
///
/// Must be called from inside the runtime.
pub fn interruptible_guard(config: &RunConfig) -> CallGuard {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received ctrl-c, cancelling outstanding requests");
            on_signal.cancel();
        }
    });
    CallGuard::new(cancel, Duration::from_secs(config.call_timeout_secs))
}
