//! Platform service construction

use crate::error::Result;
use crate::platform::{GitHubService, PlatformService};
use crate::types::RepoRef;
use std::time::Duration;

/// Creates a platform service for a repository.
///
/// The pipeline talks to more than one repository per run (the PR being
/// diffed and the docs repository receiving the patch), so it asks a
/// provider instead of holding a single service.
pub trait PlatformProvider: Send + Sync {
    /// Service bound to `repo`
    fn service(&self, repo: &RepoRef) -> Result<Box<dyn PlatformService>>;
}

/// Provider for GitHub and GitHub Enterprise
#[derive(Clone)]
pub struct GitHubProvider {
    token: String,
    timeout: Duration,
    api_base: Option<String>,
}

impl GitHubProvider {
    /// Provider deriving the API base from each repository's host
    pub fn new(token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            token: token.into(),
            timeout,
            api_base: None,
        }
    }

    /// Send every request to `api_base` regardless of host
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl PlatformProvider for GitHubProvider {
    fn service(&self, repo: &RepoRef) -> Result<Box<dyn PlatformService>> {
        let service = GitHubService::new(
            &self.token,
            repo.clone(),
            self.api_base.clone(),
            self.timeout,
        )?;
        Ok(Box::new(service))
    }
}
