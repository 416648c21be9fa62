//! Patch-to-PR pipeline
//!
//! One explicitly constructed service per run, wiring the cache, the stager
//! and the publisher together. Every failure aborts the run and is returned
//! as-is; the cached working copy is left in whatever state it reached.

use crate::cache::{CloneRemote, RepoCache};
use crate::config::Config;
use crate::diff::DiffExtractor;
use crate::error::{Error, Result};
use crate::platform::{PlatformProvider, parse_pull_request_url, parse_repo_url};
use crate::progress::{Phase, ProgressCallback};
use crate::publish::PrPublisher;
use crate::stage::{PatchStager, StageState, is_blank_patch};
use crate::types::{PatchRequest, PipelineOutcome};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// The diff → patch → PR pipeline
pub struct Pipeline {
    config: Config,
    cache: RepoCache,
    stager: PatchStager,
    publisher: PrPublisher,
    provider: Box<dyn PlatformProvider>,
}

impl Pipeline {
    /// Build a pipeline from its collaborators
    pub fn new(config: Config, remote: CloneRemote, provider: Box<dyn PlatformProvider>) -> Self {
        Self {
            cache: RepoCache::new(&config, remote),
            stager: PatchStager::new(&config),
            publisher: PrPublisher::new(&config),
            config,
            provider,
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Repository cache used by this pipeline
    pub const fn cache(&self) -> &RepoCache {
        &self.cache
    }

    /// Random branch name: the configured prefix plus 32 hex characters.
    pub fn generate_branch_name(&self) -> String {
        format!("{}{}", self.config.branch_prefix, Uuid::new_v4().simple())
    }

    /// Diff hunk for a pull request URL.
    pub async fn diff(&self, pr_url: &str, progress: &dyn ProgressCallback) -> Result<String> {
        let pr = parse_pull_request_url(pr_url)?;
        let platform = self.provider.service(&pr.repo)?;
        let extractor = DiffExtractor::new(
            &self.cache,
            self.config.diff_context,
            self.config.git_timeout(),
        );
        extractor
            .get_diff_hunk(platform.as_ref(), &pr, progress)
            .await
    }

    /// Turn a patch into a pushed branch and an open pull request.
    ///
    /// A blank patch returns [`PipelineOutcome::NoChanges`] before any git
    /// or network call is made.
    pub async fn submit(
        &self,
        request: PatchRequest,
        progress: &dyn ProgressCallback,
    ) -> Result<PipelineOutcome> {
        if is_blank_patch(&request.patch_text) {
            info!("No changes detected");
            return Ok(PipelineOutcome::NoChanges);
        }

        if request.repo_url.trim().is_empty() {
            return Err(Error::Config("repository URL is required".to_string()));
        }
        if request.reasoning.trim().is_empty() {
            return Err(Error::Config("reasoning is required".to_string()));
        }

        let repo = parse_repo_url(&request.repo_url)?;
        let branch = request
            .branch_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map_or_else(|| self.generate_branch_name(), str::to_string);
        let platform = self.provider.service(&repo)?;
        info!(repo = %repo, branch = %branch, "submitting patch");

        let report = if let Some(path) = &request.local_path {
            ensure_working_tree(path)?;
            progress.on_phase(Phase::Staging).await;
            self.stage(path, &branch, &request, progress).await?
        } else {
            progress.on_phase(Phase::PreparingCache).await;
            let lock = self.cache.lock(&request.repo_url).await?;
            let entry = self
                .cache
                .ensure(&lock, &[self.stager.trunk().to_string()])
                .await?;
            progress.on_phase(Phase::Staging).await;
            self.stage(&entry.local_path, &branch, &request, progress)
                .await?
        };

        progress
            .on_message(&format!("Pushed {}", report.branch))
            .await;
        progress.on_phase(Phase::Publishing).await;
        let record = self
            .publisher
            .publish(
                platform.as_ref(),
                request.title.as_deref(),
                &request.reasoning,
                request.triggering_reference.as_deref(),
                &report.branch,
            )
            .await
            .inspect_err(|e| {
                warn!(branch = %report.branch, error = %e, "branch pushed but PR creation failed");
            })?;
        progress.on_stage(StageState::PrCreated).await;

        Ok(PipelineOutcome::Published(record))
    }

    async fn stage(
        &self,
        path: &Path,
        branch: &str,
        request: &PatchRequest,
        progress: &dyn ProgressCallback,
    ) -> Result<crate::stage::StageReport> {
        self.stager
            .apply(
                path,
                branch,
                &request.patch_text,
                &request.reasoning,
                progress,
            )
            .await
            .map_err(|failure| {
                warn!(%failure, "staging aborted");
                Error::from(failure)
            })
    }
}

fn ensure_working_tree(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "repository path does not exist: {}",
            path.display()
        )));
    }
    if !path.join(".git").exists() {
        return Err(Error::Config(format!(
            "repository path is not a git repository: {}",
            path.display()
        )));
    }
    Ok(())
}
