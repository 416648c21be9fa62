//! Diff hunk extraction for pull requests
//!
//! Produces the unified diff between a PR's base and head branches from the
//! cached working copy, with wide context so downstream consumers see enough
//! of the surrounding code.

use crate::cache::RepoCache;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::platform::{PlatformService, parse_repo_url};
use crate::progress::{Phase, ProgressCallback};
use crate::types::PullRequestRef;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Deepening rounds before falling back to the full history.
const MAX_DEEPEN_ROUNDS: u32 = 5;

/// Computes diff hunks for pull requests using a [`RepoCache`]
pub struct DiffExtractor<'a> {
    cache: &'a RepoCache,
    context: u32,
    git_timeout: Duration,
}

impl<'a> DiffExtractor<'a> {
    /// Extractor emitting `context` lines around each change
    pub const fn new(cache: &'a RepoCache, context: u32, git_timeout: Duration) -> Self {
        Self {
            cache,
            context,
            git_timeout,
        }
    }

    /// Unified diff of the PR's head branch against its merge base with the
    /// base branch, so commits that landed on the base after the PR branched
    /// do not show up.
    ///
    /// Reflects the current remote state of both branches, so two calls can
    /// differ if either branch moved in between.
    pub async fn get_diff_hunk(
        &self,
        platform: &dyn PlatformService,
        pr: &PullRequestRef,
        progress: &dyn ProgressCallback,
    ) -> Result<String> {
        progress.on_phase(Phase::ResolvingPullRequest).await;
        let info = platform.get_pull_request(pr.number).await?;

        let repo_url = match info.clone_url.as_deref() {
            Some(url) if parse_repo_url(url).is_ok() => url.to_string(),
            _ => pr.repo.web_url(),
        };
        let base = if info.base_ref.is_empty() {
            self.cache.trunk().to_string()
        } else {
            info.base_ref.clone()
        };
        debug!(pr = %pr, head = %info.head_ref, base = %base, "resolved PR branches");

        progress.on_phase(Phase::PreparingCache).await;
        let lock = self.cache.lock(&repo_url).await?;
        let entry = self
            .cache
            .ensure(&lock, &[info.head_ref.clone(), base.clone()])
            .await?;

        progress.on_phase(Phase::Diffing).await;
        let git = Git::new(&entry.local_path, self.git_timeout);
        let unified = format!("-U{}", self.context);
        let base_ref = format!("refs/remotes/origin/{base}");
        let head_ref = format!("refs/remotes/origin/{}", info.head_ref);
        let range = if self
            .ensure_merge_base(&git, &base, &info.head_ref)
            .await?
        {
            format!("{base_ref}...{head_ref}")
        } else {
            warn!(pr = %pr, "no merge base between PR branches, diffing branch tips");
            format!("{base_ref}..{head_ref}")
        };
        let diff = git
            .run(&["diff", unified.as_str(), range.as_str(), "--"])
            .await?;

        info!(pr = %pr, bytes = diff.len(), "extracted diff hunk");
        Ok(diff)
    }

    /// Deepen the shallow history of both branches until they share a
    /// merge base. Returns `false` if they have none even in full history.
    async fn ensure_merge_base(&self, git: &Git, base: &str, head: &str) -> Result<bool> {
        let base_ref = format!("refs/remotes/origin/{base}");
        let head_ref = format!("refs/remotes/origin/{head}");
        let refspecs = [
            format!("+refs/heads/{base}:{base_ref}"),
            format!("+refs/heads/{head}:{head_ref}"),
        ];
        let deepen = format!("--deepen={}", self.cache.depth());

        for round in 0..=MAX_DEEPEN_ROUNDS {
            if git
                .succeeds(&["merge-base", base_ref.as_str(), head_ref.as_str()])
                .await?
            {
                return Ok(true);
            }
            if !is_shallow(git).await? {
                return Ok(false);
            }
            if round == MAX_DEEPEN_ROUNDS {
                break;
            }
            debug!(round, "deepening history to find merge base");
            git.run(&[
                "fetch",
                deepen.as_str(),
                "origin",
                refspecs[0].as_str(),
                refspecs[1].as_str(),
            ])
            .await?;
        }

        debug!("fetching full history to find merge base");
        git.run(&[
            "fetch",
            "--unshallow",
            "origin",
            refspecs[0].as_str(),
            refspecs[1].as_str(),
        ])
        .await?;
        git.succeeds(&["merge-base", base_ref.as_str(), head_ref.as_str()])
            .await
    }
}

async fn is_shallow(git: &Git) -> Result<bool> {
    let out = git.run(&["rev-parse", "--is-shallow-repository"]).await?;
    match out.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::Internal(format!(
            "unexpected rev-parse --is-shallow-repository output: {other}"
        ))),
    }
}
