//! Unified diffs of remote vs. reconciled content for `sync --diff`.

use similar::TextDiff;

use fleetconf_core::{RepositoryId, RepositoryUpdate};

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub repo: RepositoryId,
    pub path: String,
    pub unified_diff: String,
}

/// One diff per changed file. A new file diffs against empty content.
pub fn diff_update(update: &RepositoryUpdate) -> Vec<FileDiff> {
    update
        .changed_files()
        .map(|file| {
            let previous = normalize_line_endings(file.previous.as_deref().unwrap_or_default());
            let next = normalize_line_endings(&file.content);
            let old_header = format!("a/{}", file.path);
            let new_header = format!("b/{}", file.path);
            let unified = TextDiff::from_lines(&previous, &next)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string();
            FileDiff {
                repo: update.repo.id.clone(),
                path: file.path.clone(),
                unified_diff: unified,
            }
        })
        .collect()
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use fleetconf_core::{BranchPlan, RepositoryFileUpdate, RepositoryInfo};

    use super::*;

    fn update(previous: Option<&str>, content: &str, changed: bool) -> RepositoryUpdate {
        let repo = RepositoryInfo::synthetic(RepositoryId::new("octo", "widgets"));
        let mut update = RepositoryUpdate::new(repo, BranchPlan::direct("main"));
        update.files.push(RepositoryFileUpdate {
            path: ".github/workflows/ci.yml".to_string(),
            display_name: "ci.yml".to_string(),
            document: None,
            content: content.to_string(),
            sha: previous.map(|_| "abc".to_string()),
            previous: previous.map(str::to_string),
            changed,
            commit_url: None,
        });
        update
    }

    #[test]
    fn changed_file_produces_unified_diff() {
        let diffs = diff_update(&update(Some("name: CI\n"), "name: Build\n", true));
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/.github/workflows/ci.yml"));
        assert!(diff.contains("+++ b/.github/workflows/ci.yml"));
        assert!(diff.contains("-name: CI"));
        assert!(diff.contains("+name: Build"));
    }

    #[test]
    fn unchanged_files_are_skipped() {
        assert!(diff_update(&update(Some("a\n"), "a\n", false)).is_empty());
    }

    #[test]
    fn new_file_diffs_against_nothing() {
        let diffs = diff_update(&update(None, "name: CI\r\n", true));
        assert!(diffs[0].unified_diff.contains("+name: CI\n"));
    }
}
