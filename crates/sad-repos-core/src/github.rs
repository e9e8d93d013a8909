//! GitHub REST commit listing.
//!
//! Implements [`CommitSource`] over `GET /repos/{owner}/{name}/commits`.
//! The next page number is taken from the `rel="next"` entry of the `Link`
//! response header.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::commits::{CommitPage, CommitSource};
use crate::error::{excerpt, FetchError};
use crate::repo::RepoId;

/// Public GitHub API root.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct CommitEnvelope {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

/// Commit source backed by the GitHub REST API.
pub struct GitHubClient {
    api_url: String,
    token: String,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for `api_url` authenticating with `token`.
    ///
    /// `http` is the run-wide client; cloning it shares the connection pool.
    pub fn new(api_url: &str, token: &str, http: reqwest::Client) -> Self {
        GitHubClient {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    fn commits_url(&self, repo: &RepoId) -> String {
        format!("{}/repos/{}/{}/commits", self.api_url, repo.owner, repo.name)
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn list_commits(
        &self,
        repo: &RepoId,
        page: u32,
        per_page: u32,
    ) -> Result<CommitPage, FetchError> {
        let repo_name = repo.to_string();
        debug!(repo = %repo_name, page, per_page, "listing commits");

        let response = self
            .http
            .get(self.commits_url(repo))
            .query(&[("page", page), ("per_page", per_page)])
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                repo: repo_name.clone(),
                source,
            })?;

        let status = response.status();
        let next_page = next_page_from_link(
            response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok()),
        );
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                repo: repo_name.clone(),
                source,
            })?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized {
                repo: repo_name,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                repo: repo_name,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let commits: Vec<CommitEnvelope> =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedResponse {
                repo: repo_name,
                reason: format!("{e}; body: {}", excerpt(&body)),
            })?;

        Ok(CommitPage {
            messages: commits.into_iter().map(|c| c.commit.message).collect(),
            next_page,
        })
    }
}

/// Extract the `page` query parameter of the `rel="next"` link.
pub fn next_page_from_link(header: Option<&str>) -> Option<u32> {
    header?.split(',').find_map(|entry| {
        let mut segments = entry.split(';');
        let target = segments.next()?.trim();
        if !segments.any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = reqwest::Url::parse(url).ok()?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok());
        page
    })
}
