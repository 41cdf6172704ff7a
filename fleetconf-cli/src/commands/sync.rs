//! `fleetconf sync`: reconcile templates with every selected repository.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use fleetconf_core::{store, RepositoryId, RunConfig};
use fleetconf_renderer::TemplateEngine;
use fleetconf_sync::{
    diff, report, select_repositories, Orchestrator, Outcome, Pipeline, RandomIds, RunOptions,
    RunReport, Selection,
};

use super::{interruptible_guard, load_config, runtime, GitHubArgs};

/// Arguments for `fleetconf sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Target repository; repeat for several. Without it, repositories are searched.
    #[arg(long = "repo", value_name = "OWNER/NAME")]
    pub repos: Vec<RepositoryId>,

    /// Select repositories whose name matches; defaults to all of yours.
    #[arg(long, conflicts_with = "repos")]
    pub query: Option<String>,

    /// Branch to commit to, or to open pull requests against.
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Commit to the base branch instead of opening a draft pull request.
    #[arg(long)]
    pub direct: bool,

    /// Repositories processed at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Reconcile and report without writing; saves `fleetconf-debug.yml`.
    #[arg(long)]
    pub dry_run: bool,

    /// Print a unified diff for every changed file.
    #[arg(long)]
    pub diff: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Files")]
    files: String,
    #[tabled(rename = "Url")]
    url: String,
}

impl SyncArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(base) = &self.base_branch {
            config.base_branch = base.clone();
        }
        if self.direct {
            config.create_pr = false;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
    }

    pub fn run(self, dir: &Path) -> Result<()> {
        let mut config = load_config(dir)?;
        self.apply(&mut config);
        config.validate().context("invalid configuration")?;

        let templates = store::discover_at(dir).context("failed to discover templates")?;
        if templates.is_empty() {
            bail!(
                "no templates found in {}",
                store::store_dir_at(dir).display()
            );
        }
        let engine = TemplateEngine::new().context("failed to configure template engine")?;
        let provider = self.github.provider()?;

        let selection = if self.repos.is_empty() {
            Selection::Query(self.query.clone())
        } else {
            Selection::Repositories(self.repos.clone())
        };

        let config = Arc::new(config);
        let dry_run = self.dry_run;
        let report = runtime()?.block_on(async {
            let guard = interruptible_guard(&config);
            let repos = select_repositories(provider.clone(), &guard, &selection, config.per_page)
                .await
                .context("failed to select repositories")?;
            if repos.is_empty() {
                return Ok::<_, anyhow::Error>(None);
            }
            let pipeline = Pipeline::new(
                provider,
                Arc::new(engine),
                Arc::new(templates),
                config.clone(),
                guard,
            );
            let orchestrator =
                Orchestrator::new(pipeline, Arc::new(RandomIds::default()), RunOptions { dry_run });
            Ok(Some(orchestrator.run(repos).await))
        })?;

        let Some(report) = report else {
            println!("No repositories matched.");
            return Ok(());
        };

        if self.diff {
            print_diffs(&report);
        }
        print_report(&report, dry_run);

        if dry_run {
            let path = report::write_debug_at(dir, &report)
                .context("failed to write dry-run debug file")?;
            println!("[dry-run] reconciled files saved to {}", path.display());
        }
        Ok(())
    }
}

fn print_diffs(report: &RunReport) {
    for update in report.prepared() {
        for file in diff::diff_update(update) {
            println!("{}", format!("# {}", file.repo).bold());
            print!("{}", file.unified_diff);
        }
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let rows: Vec<ReportRow> = report
        .repositories
        .iter()
        .map(|r| ReportRow {
            repository: r.repo.to_string(),
            status: match &r.outcome {
                Outcome::Failed { stage, error } => format!("failed ({stage}): {error}"),
                other => other.label().to_string(),
            },
            files: r.changed_files().join(","),
            url: r.url(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let failed = report.failure_count();
    let total = report.repositories.len();
    let summary = format!("{prefix}{} repositories, {failed} failed", total);
    if failed == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}
