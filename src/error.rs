//! Error types for lapo

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the cache, staging and publishing layers
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or malformed (including a missing local path)
    #[error("configuration error: {0}")]
    Config(String),

    /// No access token could be found
    #[error("no GitHub token found: set GITHUB_TOKEN or GH_TOKEN, or run `gh auth login`")]
    MissingCredential,

    /// Repository or pull request URL did not match an accepted grammar
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A git subprocess exited with a non-zero status
    #[error("`git {command}` failed: {stderr}")]
    Vcs {
        /// The git arguments that were run
        command: String,
        /// Captured diagnostic output
        stderr: String,
    },

    /// Dry-run validation rejected the patch; the working tree was not touched
    #[error("patch does not apply: {diagnostic}")]
    PatchInvalid {
        /// Captured output of `git apply --check`
        diagnostic: String,
    },

    /// The host answered the pull request creation with a non-201 status
    #[error("failed to create pull request: {status} - {body}")]
    PrCreationFailed {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// Any other GitHub API failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// An external call exceeded its deadline
    #[error("timed out after {secs}s: {operation}")]
    Timeout {
        /// What was running
        operation: String,
        /// Deadline in seconds
        secs: u64,
    },

    /// The per-repository cache lock could not be acquired
    #[error("cache lock error: {0}")]
    Lock(String),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}
