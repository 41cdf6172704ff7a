//! Repository selection, resolved before any per-repository work starts.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use fleetconf_core::{RepositoryId, RepositoryInfo};

use crate::error::{ProviderError, SyncError};
use crate::provider::{CallGuard, Provider};

/// The search API never returns more than this many results for one query.
pub const SEARCH_RESULT_CAP: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit `owner/name` list.
    Repositories(Vec<RepositoryId>),
    /// Name search; `None` selects every repository of the authenticated user.
    Query(Option<String>),
}

/// Search string for a [`Selection::Query`].
pub fn search_query(login: &str, query: Option<&str>) -> String {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => format!("{q} in:name"),
        None => format!("user:{login}"),
    }
}

/// Number of pages needed for `total` matches.
pub fn page_count(total: u64, per_page: u8) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let total = total.min(SEARCH_RESULT_CAP);
    u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
}

/// Resolve `selection` to repository metadata, sorted and de-duplicated by id.
///
/// Any provider failure here aborts the run.
pub async fn select_repositories(
    provider: Arc<dyn Provider>,
    guard: &CallGuard,
    selection: &Selection,
    per_page: u8,
) -> Result<Vec<RepositoryInfo>, SyncError> {
    let found = match selection {
        Selection::Repositories(ids) => {
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                found.push(guard.run("get_repository", provider.get_repository(id)).await?);
            }
            found
        }
        Selection::Query(query) => {
            let login = guard.run("current_login", provider.current_login()).await?;
            let q = search_query(&login, query.as_deref());
            search_all(provider, guard, &q, per_page).await?
        }
    };

    let unique: BTreeMap<RepositoryId, RepositoryInfo> =
        found.into_iter().map(|r| (r.id.clone(), r)).collect();
    Ok(unique.into_values().collect())
}

/// Page 1 sizes the result; pages 2..N are fetched concurrently.
async fn search_all(
    provider: Arc<dyn Provider>,
    guard: &CallGuard,
    query: &str,
    per_page: u8,
) -> Result<Vec<RepositoryInfo>, ProviderError> {
    let first = guard
        .run("search_repositories", provider.search_repositories(query, 1, per_page))
        .await?;
    let pages = page_count(first.total_count, per_page);
    tracing::debug!(query, total = first.total_count, pages, "repository search");

    let mut found = first.items;
    let mut set = JoinSet::new();
    for page in 2..=pages {
        let provider = provider.clone();
        let guard = guard.clone();
        let query = query.to_string();
        set.spawn(async move {
            guard
                .run(
                    "search_repositories",
                    provider.search_repositories(&query, page, per_page),
                )
                .await
        });
    }
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(page) => found.extend(page?.items),
            Err(e) => {
                return Err(ProviderError::Transport {
                    operation: "search_repositories",
                    source: Box::new(e),
                })
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, "user:octo")]
    #[case(Some(""), "user:octo")]
    #[case(Some("service-"), "service- in:name")]
    fn builds_search_queries(#[case] query: Option<&str>, #[case] expected: &str) {
        assert_eq!(search_query("octo", query), expected);
    }

    #[rstest]
    #[case(0, 100, 0)]
    #[case(1, 100, 1)]
    #[case(100, 100, 1)]
    #[case(101, 100, 2)]
    #[case(5000, 100, 10)]
    fn counts_pages(#[case] total: u64, #[case] per_page: u8, #[case] expected: u32) {
        assert_eq!(page_count(total, per_page), expected);
    }
}
