//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{PlatformService, api_base_for_host};
use crate::types::{PullRequest, PullRequestInfo, RepoRef};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct CreatePullPayload<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Deserialize)]
struct CreatedPull {
    number: u64,
    html_url: String,
    title: String,
    head: BranchRef,
    base: BranchRef,
}

#[derive(Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

impl From<CreatedPull> for PullRequest {
    fn from(pr: CreatedPull) -> Self {
        Self {
            number: pr.number,
            html_url: pr.html_url,
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            title: pr.title,
        }
    }
}

/// GitHub service using octocrab for lookups and raw HTTP for PR creation
pub struct GitHubService {
    client: Octocrab,
    repo: RepoRef,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API base URL, without trailing slash
    api_base: String,
    timeout: Duration,
}

impl GitHubService {
    /// Create a new GitHub service.
    ///
    /// `api_base` overrides the base derived from the repository host.
    pub fn new(
        token: &str,
        repo: RepoRef,
        api_base: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_base = api_base
            .unwrap_or_else(|| api_base_for_host(&repo.host))
            .trim_end_matches('/')
            .to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("lapo")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            repo,
            token: token.to_string(),
            http_client,
            api_base,
            timeout,
        })
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(&self, number: u64) -> Result<PullRequestInfo> {
        debug!(repo = %self.repo, number, "getting PR");
        let pulls = self.client.pulls(&self.repo.owner, &self.repo.repo);
        let request = pulls.get(number);

        let pr = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| Error::Timeout {
                operation: format!("GET pull request {}#{number}", self.repo),
                secs: self.timeout.as_secs(),
            })??;

        let info = PullRequestInfo {
            number: pr.number,
            head_ref: pr.head.ref_field.clone(),
            base_ref: pr.base.ref_field.clone(),
            clone_url: pr
                .base
                .repo
                .as_ref()
                .and_then(|r| r.clone_url.as_ref())
                .map(ToString::to_string),
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        };

        debug!(number, head = %info.head_ref, base = %info.base_ref, "got PR");
        Ok(info)
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        debug!(repo = %self.repo, head, base, "creating PR");
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_base, self.repo.owner, self.repo.repo
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&CreatePullPayload {
                title,
                body,
                head,
                base,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        operation: format!("POST {url}"),
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    Error::GitHubApi(format!("Failed to create PR: {e}"))
                }
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.map_err(|e| {
                Error::GitHubApi(format!("Failed to read PR creation response ({status}): {e}"))
            })?;
            debug!(%status, "PR creation rejected");
            return Err(Error::PrCreationFailed {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedPull = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse created PR: {e}")))?;

        let pr = PullRequest::from(created);
        debug!(pr_number = pr.number, url = %pr.html_url, "created PR");
        Ok(pr)
    }

    fn repo(&self) -> &RepoRef {
        &self.repo
    }
}
