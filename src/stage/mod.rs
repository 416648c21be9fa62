//! Patch staging: turn patch text into a pushed branch
//!
//! Split the same way as the rest of the pipeline:
//! 1. State - the transitions a run goes through (pure, testable)
//! 2. Execute - the git calls that drive those transitions (effectful)

mod execute;
mod state;

pub use execute::{PatchStager, StageReport, is_blank_patch};
pub use state::{StageFailure, StageState};
