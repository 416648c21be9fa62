//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use lapo::error::{Error, Result};
use lapo::platform::{PlatformProvider, PlatformService};
use lapo::types::{PullRequest, PullRequestInfo, RepoRef};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub repo: RepoRef,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

#[derive(Default)]
struct MockState {
    pr_infos: Mutex<HashMap<u64, PullRequestInfo>>,
    get_pr_calls: Mutex<Vec<u64>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    // Error injection: (status, body) returned as PrCreationFailed
    create_pr_rejection: Mutex<Option<(u16, String)>>,
}

/// Simple mock platform service for testing
///
/// Cloning shares state, so a [`MockProvider`] can hand out services while
/// the test keeps a handle for setup and verification.
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Configurable PR lookups
/// - Rejection injection for PR creation
#[derive(Clone)]
pub struct MockPlatformService {
    repo: RepoRef,
    next_pr_number: Arc<AtomicU64>,
    state: Arc<MockState>,
}

impl MockPlatformService {
    /// Create a new mock for `repo`
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            next_pr_number: Arc::new(AtomicU64::new(1)),
            state: Arc::new(MockState::default()),
        }
    }

    /// Same shared state, bound to another repository
    fn bound_to(&self, repo: RepoRef) -> Self {
        Self {
            repo,
            next_pr_number: Arc::clone(&self.next_pr_number),
            state: Arc::clone(&self.state),
        }
    }

    /// Register a PR returned by `get_pull_request`
    pub fn set_pull_request(&self, number: u64, head: &str, base: &str) {
        self.state.pr_infos.lock().unwrap().insert(
            number,
            PullRequestInfo {
                number,
                head_ref: head.to_string(),
                base_ref: base.to_string(),
                clone_url: Some(format!("{}.git", self.repo.web_url())),
                html_url: format!("{}/pull/{number}", self.repo.web_url()),
            },
        );
    }

    /// Make `create_pr` fail like the host rejecting the request
    pub fn reject_create_pr(&self, status: u16, body: &str) {
        *self.state.create_pr_rejection.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Recorded `create_pr` calls
    pub fn create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.state.create_pr_calls.lock().unwrap().clone()
    }

    /// Recorded `get_pull_request` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.state.get_pr_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(&self, number: u64) -> Result<PullRequestInfo> {
        self.state.get_pr_calls.lock().unwrap().push(number);
        self.state
            .pr_infos
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("Not Found: pull request {number}")))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.state.create_pr_calls.lock().unwrap().push(CreatePrCall {
            repo: self.repo.clone(),
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });

        if let Some((status, body)) = self.state.create_pr_rejection.lock().unwrap().clone() {
            return Err(Error::PrCreationFailed { status, body });
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!("{}/pull/{number}", self.repo.web_url()),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
        })
    }

    fn repo(&self) -> &RepoRef {
        &self.repo
    }
}

/// Provider handing out services that share one mock's state
#[derive(Clone)]
pub struct MockProvider {
    pub mock: MockPlatformService,
}

impl PlatformProvider for MockProvider {
    fn service(&self, repo: &RepoRef) -> Result<Box<dyn PlatformService>> {
        Ok(Box::new(self.mock.bound_to(repo.clone())))
    }
}
