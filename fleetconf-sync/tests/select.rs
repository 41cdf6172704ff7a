mod common;

use std::sync::Arc;

use fleetconf_core::RepositoryId;
use fleetconf_sync::{select_repositories, Selection, SyncError};

use common::*;

fn names(repos: &[fleetconf_core::RepositoryInfo]) -> Vec<String> {
    repos.iter().map(|r| r.id.to_string()).collect()
}

#[tokio::test]
async fn search_fetches_every_page() {
    let provider = Arc::new(FakeProvider::new("octo"));
    for name in ["svc-a", "svc-b", "svc-c", "svc-d", "svc-e", "web"] {
        provider.add_repo(&format!("octo/{name}"));
    }

    let found = select_repositories(provider.clone(), &guard(), &Selection::Query(Some("svc".into())), 2)
        .await
        .expect("select");
    assert_eq!(
        names(&found),
        vec!["octo/svc-a", "octo/svc-b", "octo/svc-c", "octo/svc-d", "octo/svc-e"]
    );
}

#[tokio::test]
async fn no_query_selects_the_users_repositories() {
    let provider = Arc::new(FakeProvider::new("octo"));
    provider.add_repo("octo/one");
    provider.add_repo("other/two");

    let found = select_repositories(provider.clone(), &guard(), &Selection::Query(None), 100)
        .await
        .expect("select");
    assert_eq!(names(&found), vec!["octo/one"]);
}

#[tokio::test]
async fn explicit_list_is_resolved_and_deduplicated() {
    let provider = Arc::new(FakeProvider::new("octo"));
    provider.add_repo("octo/one");
    provider.add_repo("octo/two");

    let ids = vec![
        RepositoryId::new("octo", "two"),
        RepositoryId::new("octo", "one"),
        RepositoryId::new("octo", "two"),
    ];
    let found = select_repositories(provider.clone(), &guard(), &Selection::Repositories(ids), 100)
        .await
        .expect("select");
    assert_eq!(names(&found), vec!["octo/one", "octo/two"]);
}

#[tokio::test]
async fn unknown_repository_aborts_selection() {
    let provider = Arc::new(FakeProvider::new("octo"));
    let ids = vec![RepositoryId::new("octo", "ghost")];
    let err = select_repositories(provider.clone(), &guard(), &Selection::Repositories(ids), 100)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Provider(_)), "{err}");
}
