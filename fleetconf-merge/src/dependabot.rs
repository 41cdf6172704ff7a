//! Field policies for dependabot documents.

use fleetconf_core::dependabot::{BranchName, CommitMessage, Dependabot, Ignore, Update, UpdateSchedule};
use fleetconf_core::{ScalarSet, StringMap, StringSet};

use crate::policy::{keyed_by, number, present, record_union, scalar};
use crate::Merge;

impl Merge for Dependabot {
    fn merge(remote: &Self, local: &Self) -> Self {
        Dependabot {
            version: number(remote.version, local.version),
            updates: keyed_by(&remote.updates, &local.updates, |u| {
                (u.package_ecosystem.clone(), u.directory.clone())
            }),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

impl Merge for Update {
    fn merge(remote: &Self, local: &Self) -> Self {
        Update {
            package_ecosystem: local.package_ecosystem.clone(),
            directory: local.directory.clone(),
            schedule: UpdateSchedule::merge(&remote.schedule, &local.schedule),
            open_pull_requests_limit: present(
                &remote.open_pull_requests_limit,
                &local.open_pull_requests_limit,
            ),
            allow: record_union(&remote.allow, &local.allow),
            ignore: merge_ignores(&remote.ignore, &local.ignore),
            labels: StringSet::merge(&remote.labels, &local.labels),
            assignees: StringSet::merge(&remote.assignees, &local.assignees),
            reviewers: StringSet::merge(&remote.reviewers, &local.reviewers),
            target_branch: ScalarSet::merge(&remote.target_branch, &local.target_branch),
            versioning_strategy: ScalarSet::merge(&remote.versioning_strategy, &local.versioning_strategy),
            commit_message: CommitMessage {
                prefix: scalar(&remote.commit_message.prefix, &local.commit_message.prefix),
                prefix_development: scalar(
                    &remote.commit_message.prefix_development,
                    &local.commit_message.prefix_development,
                ),
                include: scalar(&remote.commit_message.include, &local.commit_message.include),
            },
            milestone: present(&remote.milestone, &local.milestone),
            pull_request_branch_name: BranchName {
                separator: scalar(
                    &remote.pull_request_branch_name.separator,
                    &local.pull_request_branch_name.separator,
                ),
            },
            rebase_strategy: scalar(&remote.rebase_strategy, &local.rebase_strategy),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

impl Merge for UpdateSchedule {
    fn merge(remote: &Self, local: &Self) -> Self {
        UpdateSchedule {
            interval: scalar(&remote.interval, &local.interval),
            day: scalar(&remote.day, &local.day),
            time: scalar(&remote.time, &local.time),
            timezone: scalar(&remote.timezone, &local.timezone),
        }
    }
}

impl Merge for Ignore {
    fn merge(remote: &Self, local: &Self) -> Self {
        Ignore {
            dependency_name: local.dependency_name.clone(),
            versions: StringSet::merge(&remote.versions, &local.versions),
            update_types: StringSet::merge(&remote.update_types, &local.update_types),
        }
    }
}

/// Union by `dependency-name`: local entries (merged with their remote
/// counterpart) first, then remote-only entries in remote order.
fn merge_ignores(remote: &[Ignore], local: &[Ignore]) -> Vec<Ignore> {
    let mut out = keyed_by(remote, local, |i| i.dependency_name.clone());
    out.extend(
        remote
            .iter()
            .filter(|r| !local.iter().any(|l| l.dependency_name == r.dependency_name))
            .cloned(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(name: &str, versions: &[&str]) -> Ignore {
        Ignore {
            dependency_name: name.into(),
            versions: versions.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn ignores_union_by_dependency_name() {
        let remote = vec![ignore("lodash", &["4.x"]), ignore("left-pad", &[])];
        let local = vec![ignore("react", &["17.x"]), ignore("lodash", &["3.x"])];
        let merged = merge_ignores(&remote, &local);
        let names: Vec<_> = merged.iter().map(|i| i.dependency_name.as_str()).collect();
        assert_eq!(names, ["react", "lodash", "left-pad"]);
        assert_eq!(merged[1].versions.0, ["3.x", "4.x"]);
    }

    #[test]
    fn explicit_zero_limit_survives() {
        let remote = Update { open_pull_requests_limit: Some(10), ..Update::new("npm", "/") };
        let local = Update { open_pull_requests_limit: Some(0), ..Update::new("npm", "/") };
        assert_eq!(Update::merge(&remote, &local).open_pull_requests_limit, Some(0));
    }
}
