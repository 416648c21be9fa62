//! Code host services
//!
//! Provides the PR lookup and creation calls the pipeline needs.

mod detection;
mod factory;
mod github;

pub use detection::{
    api_base_for_host, authenticated_clone_url, authenticated_url_for, parse_pull_request_url,
    parse_repo_url,
};
pub use factory::{GitHubProvider, PlatformProvider};
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{PullRequest, PullRequestInfo, RepoRef};
use async_trait::async_trait;

/// Platform service trait for PR operations against one repository
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Look up head/base branches and clone URL of an existing PR
    async fn get_pull_request(&self, number: u64) -> Result<PullRequestInfo>;

    /// Open a new PR.
    ///
    /// Any response other than "created" must surface as
    /// [`Error::PrCreationFailed`](crate::error::Error::PrCreationFailed)
    /// with the status and body untouched.
    async fn create_pr(&self, head: &str, base: &str, title: &str, body: &str)
    -> Result<PullRequest>;

    /// Repository this service talks to
    fn repo(&self) -> &RepoRef;
}
