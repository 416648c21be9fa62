//! lapo - turn generated documentation patches into pull requests
//!
//! The crate covers the mechanical half of an automated docs-update flow:
//!
//! - [`cache`] keeps one shallow, authenticated working copy per repository
//!   at a deterministic path, guarded by a per-repository lock
//! - [`diff`] resolves a pull request to the unified diff an external agent
//!   reasons about
//! - [`stage`] validates, applies, commits and force-pushes the agent's patch
//! - [`publish`] opens the pull request
//! - [`pipeline`] wires these together for one run

pub mod auth;
pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod publish;
pub mod stage;
pub mod types;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
