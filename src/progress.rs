//! Progress reporting for long-running pipeline steps

use crate::stage::StageState;
use async_trait::async_trait;

/// Pipeline phase, reported before the corresponding work starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resolving PR metadata from the host
    ResolvingPullRequest,
    /// Cloning or refreshing the cached working copy
    PreparingCache,
    /// Computing the diff hunk
    Diffing,
    /// Staging the patch onto a branch
    Staging,
    /// Opening the pull request
    Publishing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResolvingPullRequest => write!(f, "Resolving pull request"),
            Self::PreparingCache => write!(f, "Preparing repository"),
            Self::Diffing => write!(f, "Computing diff"),
            Self::Staging => write!(f, "Staging patch"),
            Self::Publishing => write!(f, "Opening pull request"),
        }
    }
}

/// Receives progress updates from the pipeline
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A new phase started
    async fn on_phase(&self, phase: Phase);

    /// Staging reached a new state
    async fn on_stage(&self, state: StageState);

    /// Free-form status line
    async fn on_message(&self, message: &str);
}

/// Progress callback that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}

    async fn on_stage(&self, _state: StageState) {}

    async fn on_message(&self, _message: &str) {}
}
