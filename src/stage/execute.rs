//! Patch staging execution - effectful operations
//!
//! Drives a working copy through the staging states with git calls, stopping
//! at the first failure. Nothing is rolled back; the cache refresh on the next
//! run resets the tree.

use crate::config::{CommitIdentity, Config};
use crate::error::{Error, Result};
use crate::git::Git;
use crate::progress::ProgressCallback;
use crate::stage::state::{StageFailure, StageState};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// True when the patch has no non-whitespace content.
///
/// Blank patches are a successful no-op and must be screened out before
/// staging, since committing an empty change fails.
pub fn is_blank_patch(patch: &str) -> bool {
    patch.chars().all(char::is_whitespace)
}

/// Outcome of a successful staging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Branch that was pushed
    pub branch: String,
    /// Commit the branch points at
    pub commit: String,
    /// Final state (always [`StageState::Pushed`])
    pub state: StageState,
}

/// Applies patches to a working copy and pushes the result
#[derive(Debug, Clone)]
pub struct PatchStager {
    trunk: String,
    depth: u32,
    git_timeout: Duration,
    identity: CommitIdentity,
}

/// Tracks the current state and tags errors with it.
struct Run<'a> {
    state: StageState,
    progress: &'a dyn ProgressCallback,
}

impl Run<'_> {
    async fn advance(&mut self, to: StageState) {
        debug_assert_eq!(self.state.next(), Some(to));
        self.state = to;
        debug!(state = %to, "staging state");
        self.progress.on_stage(to).await;
    }

    fn fail(&self, error: Error) -> StageFailure {
        StageFailure::new(self.state, error)
    }
}

impl PatchStager {
    /// Stager using the trunk, depth, timeout and identity from `config`
    pub fn new(config: &Config) -> Self {
        Self {
            trunk: config.trunk_branch.clone(),
            depth: config.clone_depth.max(1),
            git_timeout: config.git_timeout(),
            identity: config.commit.clone(),
        }
    }

    /// Trunk branch new branches are cut from
    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    /// Cut `branch_name` from fresh trunk, apply `patch_text`, commit it
    /// with `commit_message` and force-push the branch.
    ///
    /// The patch is dry-run checked before anything touches the working
    /// tree; a rejected patch yields [`Error::PatchInvalid`] with the tree
    /// unchanged. The commit holds exactly what the patch touches, so
    /// untracked files and unstaged edits in the tree are never pushed.
    pub async fn apply(
        &self,
        local_path: &Path,
        branch_name: &str,
        patch_text: &str,
        commit_message: &str,
        progress: &dyn ProgressCallback,
    ) -> std::result::Result<StageReport, StageFailure> {
        let mut run = Run {
            state: StageState::Cloned,
            progress,
        };
        let git = Git::new(local_path, self.git_timeout);

        if !local_path.join(".git").exists() {
            return Err(run.fail(Error::Config(format!(
                "not a git working tree: {}",
                local_path.display()
            ))));
        }

        self.checkout_fresh_trunk(&git)
            .await
            .map_err(|e| run.fail(e))?;
        git.run(&["checkout", "-B", branch_name])
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(StageState::BranchCreated).await;

        // Removed on every exit path when dropped.
        let patch_file = write_patch_file(patch_text).map_err(|e| run.fail(e))?;
        let patch_path = patch_file.path().to_string_lossy().into_owned();

        // Only the patch may end up in the commit.
        let index_clean = git
            .succeeds(&["diff", "--cached", "--quiet"])
            .await
            .map_err(|e| run.fail(e))?;
        if !index_clean {
            return Err(run.fail(Error::Config(format!(
                "working tree has staged changes: {}",
                local_path.display()
            ))));
        }

        match git
            .run(&["apply", "--check", "--index", patch_path.as_str()])
            .await
        {
            Ok(_) => {}
            Err(Error::Vcs { stderr, .. }) => {
                info!(branch = branch_name, "patch rejected by dry run");
                return Err(run.fail(Error::PatchInvalid { diagnostic: stderr }));
            }
            Err(e) => return Err(run.fail(e)),
        }
        run.advance(StageState::PatchValidated).await;

        git.run(&["apply", "--index", patch_path.as_str()])
            .await
            .map_err(|e| run.fail(e))?;
        drop(patch_file);
        run.advance(StageState::PatchApplied).await;

        let commit = self
            .commit_index(&git, commit_message)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(StageState::Committed).await;

        git.run(&["push", "-f", "origin", branch_name])
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(StageState::Pushed).await;

        info!(branch = branch_name, %commit, "patch staged and pushed");
        Ok(StageReport {
            branch: branch_name.to_string(),
            commit,
            state: run.state,
        })
    }

    async fn checkout_fresh_trunk(&self, git: &Git) -> Result<()> {
        let trunk = self.trunk.as_str();
        let refspec = format!("+refs/heads/{trunk}:refs/remotes/origin/{trunk}");

        // Only deepen-limited fetches in clones that are already shallow;
        // a full working tree supplied by the caller stays full.
        let shallow = git
            .run(&["rev-parse", "--is-shallow-repository"])
            .await?
            .trim()
            == "true";
        if shallow {
            let depth = self.depth.to_string();
            git.run(&["fetch", "--depth", depth.as_str(), "origin", refspec.as_str()])
                .await?;
        } else {
            git.run(&["fetch", "origin", refspec.as_str()]).await?;
        }

        let remote_ref = format!("refs/remotes/origin/{trunk}");
        git.run(&["checkout", "-B", trunk, remote_ref.as_str(), "--"])
            .await?;
        Ok(())
    }

    async fn commit_index(&self, git: &Git, message: &str) -> Result<String> {
        let name = format!("user.name={}", self.identity.author_name);
        let email = format!("user.email={}", self.identity.author_email);

        git.run(&[
            "-c",
            name.as_str(),
            "-c",
            email.as_str(),
            "commit",
            "-m",
            message,
        ])
        .await?;

        Ok(git.run(&["rev-parse", "HEAD"]).await?.trim().to_string())
    }
}

fn write_patch_file(patch_text: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("lapo-")
        .suffix(".patch")
        .tempfile()?;
    file.write_all(patch_text.as_bytes())?;
    // git apply treats a missing final newline as a corrupt patch.
    if !patch_text.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(file)
}
