//! `fleetconf repos`: list the repositories a sync would select.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use fleetconf_core::RepositoryInfo;
use fleetconf_sync::{select_repositories, Selection};

use super::{interruptible_guard, load_config, runtime, GitHubArgs};

/// Arguments for `fleetconf repos`.
#[derive(Args, Debug)]
pub struct ReposArgs {
    /// Select repositories whose name matches; defaults to all of yours.
    #[arg(long)]
    pub query: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Tabled)]
struct RepoRow {
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Default branch")]
    default_branch: String,
    #[tabled(rename = "Private")]
    private: bool,
    #[tabled(rename = "Archived")]
    archived: bool,
}

impl ReposArgs {
    pub fn run(self, dir: &Path) -> Result<()> {
        let config = load_config(dir)?;
        config.validate().context("invalid configuration")?;
        let provider = self.github.provider()?;
        let selection = Selection::Query(self.query.clone());

        let repos: Vec<RepositoryInfo> = runtime()?.block_on(async {
            let guard = interruptible_guard(&config);
            select_repositories(provider, &guard, &selection, config.per_page).await
        })
        .context("failed to select repositories")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&repos)?);
            return Ok(());
        }
        if repos.is_empty() {
            println!("No repositories matched.");
            return Ok(());
        }

        let rows: Vec<RepoRow> = repos
            .into_iter()
            .map(|r| RepoRow {
                repository: r.id.to_string(),
                default_branch: r.default_branch,
                private: r.private,
                archived: r.archived,
            })
            .collect();
        let count = rows.len();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{count} repositories");
        Ok(())
    }
}
