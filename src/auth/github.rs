//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Resolved GitHub credential
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// Access token, used for API calls and embedded into clone URLs
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Look up a token through `lookup`, skipping unset and blank values.
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<GitHubAuthConfig> {
    TOKEN_ENV_VARS.iter().find_map(|name| {
        let token = lookup(name)?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        debug!(var = name, "using GitHub token from environment");
        Some(GitHubAuthConfig {
            token: token.to_string(),
            source: AuthSource::EnvVar,
        })
    })
}

/// Resolve a GitHub token from the environment, falling back to `gh auth token`.
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    if let Some(config) = token_from_env(|name| std::env::var(name).ok()) {
        return Ok(config);
    }

    let output = match Command::new("gh").args(["auth", "token"]).output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "gh CLI not available");
            return Err(Error::MissingCredential);
        }
    };

    if !output.status.success() {
        debug!(status = %output.status, "gh auth token returned non-success");
        return Err(Error::MissingCredential);
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::MissingCredential);
    }

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}
