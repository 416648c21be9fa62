//! Core types for lapo

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A repository on a code host, parsed from a clone or web URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Host name, lowercased (e.g. "github.com")
    pub host: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name, without `.git`
    pub repo: String,
}

impl RepoRef {
    /// Canonical `host/owner/repo` form. Cache keys are derived from this.
    pub fn canonical(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.repo)
    }

    /// Web URL of the repository
    pub fn web_url(&self) -> String {
        format!("https://{}", self.canonical())
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A pull request reference parsed from `https://host/owner/repo/pull/<n>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Repository the PR belongs to
    pub repo: RepoRef,
    /// PR number
    pub number: u64,
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// PR metadata needed to compute a diff hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    /// PR number
    pub number: u64,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Clone URL of the base repository, when the host reported one
    pub clone_url: Option<String>,
    /// Web URL for the PR
    pub html_url: String,
}

/// A pull request as returned by the host after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// A repository working copy held in the on-disk cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Repository URL as given by the caller
    pub repo_url: String,
    /// Deterministic key derived from the repository
    pub hash_key: String,
    /// Location of the working copy
    pub local_path: PathBuf,
    /// Branches fetched during the last `ensure`
    pub fetched_branches: Vec<String>,
}

/// Input for one submit run
#[derive(Debug, Clone, Default)]
pub struct PatchRequest {
    /// Repository to open the PR against
    pub repo_url: String,
    /// Branch to push; generated when `None`
    pub branch_name: Option<String>,
    /// PR title, without the tool prefix
    pub title: Option<String>,
    /// Rationale for the change; also used as commit message
    pub reasoning: String,
    /// Unified diff to apply
    pub patch_text: String,
    /// What triggered the change (usually a PR URL)
    pub triggering_reference: Option<String>,
    /// Existing working tree to use instead of the cache
    pub local_path: Option<PathBuf>,
}

/// A pull request opened by the publisher. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Full title, including prefix
    pub title: String,
    /// Body as sent to the host
    pub body: String,
    /// Branch the PR is opened from
    pub head_branch: String,
    /// Branch the PR targets
    pub base_branch: String,
    /// PR number
    pub number: u64,
    /// Canonical web URL of the PR
    pub result_url: String,
    /// When the host accepted the PR
    pub created_at: DateTime<Utc>,
}

/// Result of a submit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The patch was blank; nothing was committed, pushed or opened
    NoChanges,
    /// A pull request was opened
    Published(PullRequestRecord),
}

impl PipelineOutcome {
    /// The opened PR, if any
    pub const fn record(&self) -> Option<&PullRequestRecord> {
        match self {
            Self::NoChanges => None,
            Self::Published(record) => Some(record),
        }
    }
}
