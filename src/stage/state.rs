//! Staging state machine
//!
//! A run moves `Cloned → BranchCreated → PatchValidated → PatchApplied →
//! Committed → Pushed → PrCreated`. A failure records the last state that was
//! reached, which identifies the transition that failed and what was left
//! behind in the working copy.

use crate::error::Error;

/// Progress of a single patch-to-PR run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageState {
    /// A working copy exists
    Cloned,
    /// The target branch was cut from fresh trunk and checked out
    BranchCreated,
    /// `git apply --check` accepted the patch
    PatchValidated,
    /// The patch was applied to the working tree
    PatchApplied,
    /// The changes were committed
    Committed,
    /// The branch was force-pushed
    Pushed,
    /// The pull request was opened
    PrCreated,
}

impl StageState {
    /// The state a successful transition from `self` leads to
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Cloned => Some(Self::BranchCreated),
            Self::BranchCreated => Some(Self::PatchValidated),
            Self::PatchValidated => Some(Self::PatchApplied),
            Self::PatchApplied => Some(Self::Committed),
            Self::Committed => Some(Self::Pushed),
            Self::Pushed => Some(Self::PrCreated),
            Self::PrCreated => None,
        }
    }

    /// Whether the working tree may differ from the branch's starting point
    pub const fn tree_mutated(self) -> bool {
        matches!(
            self,
            Self::PatchApplied | Self::Committed | Self::Pushed | Self::PrCreated
        )
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloned => write!(f, "cloned"),
            Self::BranchCreated => write!(f, "branch created"),
            Self::PatchValidated => write!(f, "patch validated"),
            Self::PatchApplied => write!(f, "patch applied"),
            Self::Committed => write!(f, "committed"),
            Self::Pushed => write!(f, "pushed"),
            Self::PrCreated => write!(f, "PR created"),
        }
    }
}

/// A run that stopped before reaching its final state
#[derive(Debug)]
pub struct StageFailure {
    /// Last state reached before the failure
    pub reached: StageState,
    /// What went wrong
    pub error: Error,
}

impl StageFailure {
    /// Failure while leaving `reached`
    pub const fn new(reached: StageState, error: Error) -> Self {
        Self { reached, error }
    }

    /// The state the failed transition was heading to
    pub const fn failed_transition(&self) -> Option<StageState> {
        self.reached.next()
    }
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failed_transition() {
            Some(target) => write!(f, "failed {} → {}: {}", self.reached, target, self.error),
            None => write!(f, "failed after {}: {}", self.reached, self.error),
        }
    }
}

impl From<StageFailure> for Error {
    fn from(failure: StageFailure) -> Self {
        failure.error
    }
}
