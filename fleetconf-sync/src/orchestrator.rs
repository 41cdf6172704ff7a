//! Fleet orchestrator: one task per repository, at most `concurrency` in
//! flight.
//!
//! ```text
//! selected ─► prepared ─┬─► written ─► reported
//!                       ├─► no changes ─► reported
//!                       └─► (dry run) ─► reported
//!        failed ◄── prepare / write
//! ```
//!
//! Workers share the provider and a results channel sized to the number of
//! repositories, so a send never waits. A failing repository never affects
//! another one.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use fleetconf_core::{BranchPlan, RepositoryId, RepositoryInfo, RepositoryUpdate};

use crate::error::SyncError;
use crate::ids::BranchIdGenerator;
use crate::pipeline::Pipeline;
use crate::writer::write_update;

/// Where a repository failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Write,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Prepare => "prepare",
            Stage::Write => "write",
            Stage::Internal => "internal",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written,
    DryRun,
    NoChanges,
    Failed { stage: Stage, error: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Written => "written",
            Outcome::DryRun => "dry-run",
            Outcome::NoChanges => "no changes",
            Outcome::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One row of the run report.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryReport {
    pub repo: RepositoryId,
    pub outcome: Outcome,
    /// Present for every repository that got past `prepare`.
    pub update: Option<RepositoryUpdate>,
}

impl RepositoryReport {
    fn failed(repo: RepositoryId, stage: Stage, error: impl ToString) -> Self {
        Self {
            repo,
            outcome: Outcome::Failed {
                stage,
                error: error.to_string(),
            },
            update: None,
        }
    }

    /// Changed file display names.
    pub fn changed_files(&self) -> Vec<&str> {
        self.update
            .iter()
            .flat_map(|u| u.changed_files())
            .map(|f| f.display_name.as_str())
            .collect()
    }

    /// PR URL, or the comma-separated commit URLs of a direct write.
    pub fn url(&self) -> String {
        let Some(update) = &self.update else {
            return String::new();
        };
        if let Some(pr) = &update.pull_request_url {
            return pr.clone();
        }
        update
            .files
            .iter()
            .filter_map(|f| f.commit_url.as_deref())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Every selected repository, sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &RepositoryReport> {
        self.repositories.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Updates that were prepared successfully (written, dry run or unchanged).
    pub fn prepared(&self) -> impl Iterator<Item = &RepositoryUpdate> {
        self.repositories.iter().filter_map(|r| r.update.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Prepare only; never write.
    pub dry_run: bool,
}

pub struct Orchestrator {
    pipeline: Pipeline,
    ids: Arc<dyn BranchIdGenerator>,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline, ids: Arc<dyn BranchIdGenerator>, options: RunOptions) -> Self {
        Self {
            pipeline,
            ids,
            options,
        }
    }

    fn plan_for(&self) -> BranchPlan {
        let config = self.pipeline.config();
        if config.create_pr {
            let branch = config.branch_name(&self.ids.generate());
            BranchPlan::pull_request(config.base_branch.clone(), branch)
        } else {
            BranchPlan::direct(config.base_branch.clone())
        }
    }

    /// Process every repository and report on each of them.
    pub async fn run(&self, repos: Vec<RepositoryInfo>) -> RunReport {
        let total = repos.len();
        let concurrency = self.pipeline.config().concurrency.max(1);
        tracing::info!(repositories = total, concurrency, dry_run = self.options.dry_run, "starting sync");

        let sem = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::channel::<RepositoryReport>(total.max(1));
        let mut set = JoinSet::new();
        let selected: BTreeSet<RepositoryId> = repos.iter().map(|r| r.id.clone()).collect();

        for repo in repos {
            let sem = sem.clone();
            let tx = tx.clone();
            let pipeline = self.pipeline.clone();
            let plan = self.plan_for();
            let options = self.options;
            set.spawn(async move {
                let id = repo.id.clone();
                let report = match sem.acquire_owned().await {
                    Ok(_permit) => process(&pipeline, repo, plan, options).await,
                    Err(e) => RepositoryReport::failed(id, Stage::Internal, e),
                };
                // Capacity equals the repository count.
                let _ = tx.send(report).await;
            });
        }
        drop(tx);

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "repository worker ended abnormally");
            }
        }

        let mut reports = Vec::with_capacity(total);
        while let Some(report) = rx.recv().await {
            reports.push(report);
        }

        let reported: BTreeSet<RepositoryId> = reports.iter().map(|r| r.repo.clone()).collect();
        for missing in selected.difference(&reported) {
            tracing::error!(repo = %missing, "repository was not fully processed");
            reports.push(RepositoryReport::failed(
                missing.clone(),
                Stage::Internal,
                SyncError::Internal("worker ended without a report".to_string()),
            ));
        }

        reports.sort_by(|a, b| a.repo.cmp(&b.repo));
        let report = RunReport {
            repositories: reports,
        };
        tracing::info!(
            repositories = total,
            failed = report.failure_count(),
            "sync finished"
        );
        report
    }
}

/// Prepare, then write unless this is a dry run or nothing changed.
async fn process(
    pipeline: &Pipeline,
    repo: RepositoryInfo,
    plan: BranchPlan,
    options: RunOptions,
) -> RepositoryReport {
    let id = repo.id.clone();

    let mut update = match pipeline.prepare(repo, plan).await {
        Ok(update) => update,
        Err(e) => {
            if pipeline.guard().is_cancelled() {
                tracing::warn!(repo = %id, "cancelled before completion");
            } else {
                tracing::error!(repo = %id, error = %e, "prepare failed");
            }
            return RepositoryReport::failed(id, Stage::Prepare, e);
        }
    };

    let outcome = if !update.has_changes() {
        tracing::info!(repo = %id, "no changes");
        Outcome::NoChanges
    } else if options.dry_run {
        Outcome::DryRun
    } else {
        match write_update(pipeline.provider(), pipeline.guard(), pipeline.config(), &mut update).await {
            Ok(()) => Outcome::Written,
            Err(e) => {
                if pipeline.guard().is_cancelled() {
                    tracing::warn!(repo = %id, "cancelled before completion");
                } else {
                    tracing::error!(repo = %id, error = %e, "write failed");
                }
                return RepositoryReport::failed(id, Stage::Write, e);
            }
        }
    };

    RepositoryReport {
        repo: id,
        outcome,
        update: Some(update),
    }
}
