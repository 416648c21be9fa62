//! Pull request publishing
//!
//! Builds the PR title and body and opens the PR through the platform
//! service. No retries and no deduplication: a second call with the same
//! branch may open a second PR, depending on the host.

use crate::config::Config;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::PullRequestRecord;
use chrono::Utc;
use tracing::info;

/// Title used when the caller supplies none
pub const DEFAULT_TITLE: &str = "Update docs from changes in related code";

/// Triggering reference used when the caller supplies none
pub const DEFAULT_TRIGGER: &str = "No information provided";

const PREAMBLE: &str = "This is an automated pull request created by the \
[LapoDocs](https://github.com/grafana/llm-auto-update-docs) tool.";

/// Opens pull requests for pushed branches
#[derive(Debug, Clone)]
pub struct PrPublisher {
    title_prefix: String,
    base_branch: String,
}

impl PrPublisher {
    /// Publisher using the title prefix and trunk branch from `config`
    pub fn new(config: &Config) -> Self {
        Self {
            title_prefix: config.title_prefix.clone(),
            base_branch: config.trunk_branch.clone(),
        }
    }

    /// Branch PRs are opened against
    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    /// Title with the tool prefix; falls back to [`DEFAULT_TITLE`].
    pub fn compose_title(&self, title: Option<&str>) -> String {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        format!("{}{title}", self.title_prefix)
    }

    /// Body with the preamble, the reasoning and the triggering reference,
    /// each in its own section.
    pub fn compose_body(reasoning: &str, triggering_reference: Option<&str>) -> String {
        let trigger = triggering_reference
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TRIGGER);
        format!(
            "{PREAMBLE}\n\n## Reasoning for the changes:\n\n{}\n\n## PR that triggered these changes:\n\n{trigger}\n",
            reasoning.trim()
        )
    }

    /// Open a PR from `branch_name` into the base branch.
    pub async fn publish(
        &self,
        platform: &dyn PlatformService,
        title: Option<&str>,
        reasoning: &str,
        triggering_reference: Option<&str>,
        branch_name: &str,
    ) -> Result<PullRequestRecord> {
        let title = self.compose_title(title);
        let body = Self::compose_body(reasoning, triggering_reference);

        let pr = platform
            .create_pr(branch_name, &self.base_branch, &title, &body)
            .await?;

        info!(repo = %platform.repo(), number = pr.number, url = %pr.html_url, "opened pull request");
        Ok(PullRequestRecord {
            title,
            body,
            head_branch: branch_name.to_string(),
            base_branch: self.base_branch.clone(),
            number: pr.number,
            result_url: pr.html_url,
            created_at: Utc::now(),
        })
    }
}
