//! [`Provider`] implementation for the GitHub REST API, on `octocrab`.
//!
//! Only the generic `get`/`put`/`post` routes are used; the response bodies
//! are decoded into the small structs below so the crate depends on a handful
//! of fields rather than octocrab's full model types.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::StatusCode;
use octocrab::{GitHubError, Octocrab};
use serde::{Deserialize, Serialize};

use fleetconf_core::{RepositoryId, RepositoryInfo};

use crate::error::ProviderError;
use crate::provider::{
    EntryKind, GitRef, NewPullRequest, Provider, PutFile, RemoteEntry, RemoteFile, SearchPage,
};

pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    /// Authenticate with a personal access token. `api_url` overrides the
    /// API root for GitHub Enterprise installations.
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self, ProviderError> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| ProviderError::Client(format!("invalid API URL '{url}': {e}")))?;
        }
        let client = builder.build().map_err(|e| ProviderError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Deserialize)]
struct ApiRepository {
    name: String,
    owner: ApiOwner,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<ApiRepository> for RepositoryInfo {
    fn from(r: ApiRepository) -> Self {
        RepositoryInfo {
            id: RepositoryId::new(r.owner.login, r.name),
            default_branch: r.default_branch.unwrap_or_else(|| "main".to_string()),
            description: r.description.unwrap_or_default(),
            html_url: r.html_url.unwrap_or_default(),
            private: r.private,
            archived: r.archived,
            topics: r.topics,
        }
    }
}

#[derive(Deserialize)]
struct ApiSearch {
    total_count: u64,
    #[serde(default)]
    items: Vec<ApiRepository>,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct RefParams<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

#[derive(Deserialize)]
struct ApiEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ApiFile {
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct ApiPutFile<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiCommit {
    html_url: String,
}

#[derive(Deserialize)]
struct ApiPutResponse {
    commit: ApiCommit,
}

#[derive(Deserialize)]
struct ApiObject {
    sha: String,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    name: String,
    object: ApiObject,
}

#[derive(Serialize)]
struct ApiNewRef<'a> {
    #[serde(rename = "ref")]
    name: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct ApiNewPull<'a> {
    title: &'a str,
    body: &'a str,
    base: &'a str,
    head: &'a str,
    draft: bool,
}

#[derive(Deserialize)]
struct ApiPull {
    html_url: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn api_err(operation: &'static str, err: octocrab::Error) -> ProviderError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let source = *source;
            ProviderError::Status {
                operation,
                status: source.status_code.as_u16(),
                message: source.message,
            }
        }
        other => ProviderError::Transport {
            operation,
            source: Box::new(other),
        },
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(
        err,
        octocrab::Error::GitHub { source, .. }
            if matches!(**source, GitHubError { status_code: StatusCode::NOT_FOUND, .. })
    )
}

fn repo_route(repo: &RepositoryId) -> String {
    format!("/repos/{}/{}", repo.owner, repo.name)
}

fn decode_content(operation: &'static str, file: ApiFile) -> Result<RemoteFile, ProviderError> {
    let raw = file.content.unwrap_or_default();
    let content = match file.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(compact).map_err(|e| ProviderError::Decode {
                operation,
                message: format!("{}: {e}", file.path),
            })?;
            String::from_utf8(bytes).map_err(|e| ProviderError::Decode {
                operation,
                message: format!("{}: {e}", file.path),
            })?
        }
        Some(other) => {
            return Err(ProviderError::Decode {
                operation,
                message: format!("{}: unsupported encoding '{other}'", file.path),
            })
        }
    };
    Ok(RemoteFile {
        path: file.path,
        sha: file.sha,
        content,
    })
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[async_trait]
impl Provider for GitHubProvider {
    async fn current_login(&self) -> Result<String, ProviderError> {
        let user = self
            .client
            .current()
            .user()
            .await
            .map_err(|e| api_err("current_login", e))?;
        Ok(user.login)
    }

    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, ProviderError> {
        let params = SearchParams { q: query, per_page, page };
        let found: ApiSearch = self
            .client
            .get("/search/repositories", Some(&params))
            .await
            .map_err(|e| api_err("search_repositories", e))?;
        Ok(SearchPage {
            total_count: found.total_count,
            items: found.items.into_iter().map(RepositoryInfo::from).collect(),
        })
    }

    async fn get_repository(&self, repo: &RepositoryId) -> Result<RepositoryInfo, ProviderError> {
        let found: ApiRepository = self
            .client
            .get(repo_route(repo), None::<&()>)
            .await
            .map_err(|e| api_err("get_repository", e))?;
        Ok(found.into())
    }

    async fn list_directory(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<RemoteEntry>>, ProviderError> {
        let route = format!("{}/contents/{path}", repo_route(repo));
        let result: Result<Vec<ApiEntry>, _> =
            self.client.get(route, Some(&RefParams { git_ref })).await;
        match result {
            Ok(entries) => Ok(Some(
                entries
                    .into_iter()
                    .map(|e| RemoteEntry {
                        kind: match e.kind.as_str() {
                            "file" => EntryKind::File,
                            "dir" => EntryKind::Dir,
                            _ => EntryKind::Other,
                        },
                        name: e.name,
                        path: e.path,
                        sha: e.sha,
                    })
                    .collect(),
            )),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(api_err("list_directory", e)),
        }
    }

    async fn get_file(
        &self,
        repo: &RepositoryId,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RemoteFile>, ProviderError> {
        let route = format!("{}/contents/{path}", repo_route(repo));
        let result: Result<ApiFile, _> = self.client.get(route, Some(&RefParams { git_ref })).await;
        match result {
            Ok(file) => decode_content("get_file", file).map(Some),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(api_err("get_file", e)),
        }
    }

    async fn put_file(&self, repo: &RepositoryId, file: &PutFile) -> Result<String, ProviderError> {
        let route = format!("{}/contents/{}", repo_route(repo), file.path);
        let body = ApiPutFile {
            message: &file.message,
            content: STANDARD.encode(file.content.as_bytes()),
            branch: &file.branch,
            sha: file.sha.as_deref(),
        };
        let response: ApiPutResponse = self
            .client
            .put(route, Some(&body))
            .await
            .map_err(|e| api_err("put_file", e))?;
        Ok(response.commit.html_url)
    }

    async fn list_matching_refs(
        &self,
        repo: &RepositoryId,
        prefix: &str,
    ) -> Result<Vec<GitRef>, ProviderError> {
        let route = format!("{}/git/matching-refs/{prefix}", repo_route(repo));
        let refs: Vec<ApiRef> = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| api_err("list_matching_refs", e))?;
        Ok(refs
            .into_iter()
            .map(|r| GitRef {
                name: r.name,
                sha: r.object.sha,
            })
            .collect())
    }

    async fn create_ref(
        &self,
        repo: &RepositoryId,
        name: &str,
        sha: &str,
    ) -> Result<(), ProviderError> {
        let route = format!("{}/git/refs", repo_route(repo));
        let _created: serde_json::Value = self
            .client
            .post(route, Some(&ApiNewRef { name, sha }))
            .await
            .map_err(|e| api_err("create_ref", e))?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pr: &NewPullRequest,
    ) -> Result<String, ProviderError> {
        let route = format!("{}/pulls", repo_route(repo));
        let body = ApiNewPull {
            title: &pr.title,
            body: &pr.body,
            base: &pr.base,
            head: &pr.head,
            draft: pr.draft,
        };
        let created: ApiPull = self
            .client
            .post(route, Some(&body))
            .await
            .map_err(|e| api_err("create_pull_request", e))?;
        Ok(created.html_url)
    }
}
