//! Write path: commit changed files directly, or to a new branch with a
//! draft pull request.
//!
//! Files are committed one at a time in the order the pipeline produced
//! them. A failure stops the repository; commits already made stay.

use fleetconf_core::{RepositoryUpdate, RunConfig};

use crate::error::SyncError;
use crate::provider::{CallGuard, NewPullRequest, Provider, PutFile};

/// Write every changed file of `update`, filling in commit URLs and, in
/// pull-request mode, the pull request URL.
///
/// Does nothing when no file changed.
pub async fn write_update(
    provider: &dyn Provider,
    guard: &CallGuard,
    config: &RunConfig,
    update: &mut RepositoryUpdate,
) -> Result<(), SyncError> {
    if !update.has_changes() {
        return Ok(());
    }
    let repo = update.repo.id.clone();

    if let Some(branch_ref) = update.plan.pr_branch_ref() {
        let base_ref = update.plan.base_ref();
        let prefix = base_ref.trim_start_matches("refs/");
        let refs = guard
            .run("list_matching_refs", provider.list_matching_refs(&repo, prefix))
            .await?;
        let Some(base) = refs.into_iter().find(|r| r.name == base_ref) else {
            return Err(SyncError::BaseRefNotFound {
                repo,
                base: update.plan.base.clone(),
            });
        };
        guard
            .run("create_ref", provider.create_ref(&repo, &branch_ref, &base.sha))
            .await?;
        tracing::info!(repo = %repo, branch = %branch_ref, base = %base.sha, "created branch");
    }

    let branch = update.plan.target_branch().to_string();
    for file in update.files.iter_mut().filter(|f| f.changed) {
        let put = PutFile {
            path: file.path.clone(),
            content: file.content.clone(),
            message: config.commit_message_for(&file.display_name),
            branch: branch.clone(),
            sha: file.sha.clone(),
        };
        let url = guard.run("put_file", provider.put_file(&repo, &put)).await?;
        tracing::info!(repo = %repo, file = %file.path, branch = %branch, "committed");
        file.commit_url = Some(url);
    }

    if let Some(head) = update.plan.branch.clone() {
        let pr = NewPullRequest {
            title: config.pr_title.clone(),
            body: config.pr_body.clone(),
            base: update.plan.base.clone(),
            head,
            draft: true,
        };
        let url = guard
            .run("create_pull_request", provider.create_pull_request(&repo, &pr))
            .await?;
        tracing::info!(repo = %repo, url = %url, "opened draft pull request");
        update.pull_request_url = Some(url);
    }

    Ok(())
}
