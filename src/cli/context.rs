//! Shared command context for CLI commands
//!
//! Extracts the setup shared by the diff and submit commands.

use lapo::Pipeline;
use lapo::auth::get_github_auth;
use lapo::cache::CloneRemote;
use lapo::config::{Config, default_config_path, load_config};
use lapo::error::Result;
use lapo::platform::GitHubProvider;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global options that affect configuration
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Override for the cache root
    pub cache_dir: Option<PathBuf>,
    /// Override for the mirror root
    pub mirror_root: Option<PathBuf>,
}

/// Load the config file and apply CLI overrides.
pub fn resolve_config(options: &GlobalOptions) -> Result<Config> {
    let mut config = match options.config.as_deref().map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)?
        }
        None => Config::default(),
    };

    if let Some(dir) = &options.cache_dir {
        config.cache_dir.clone_from(dir);
    }
    if let Some(root) = &options.mirror_root {
        config.mirror_root = Some(root.clone());
    }
    Ok(config)
}

/// Shared context for commands that talk to GitHub
pub struct CommandContext {
    /// Pipeline for this invocation
    pub pipeline: Pipeline,
}

impl CommandContext {
    /// Resolve config and credentials and build the pipeline
    pub async fn new(options: &GlobalOptions) -> Result<Self> {
        let config = resolve_config(options)?;
        let auth = get_github_auth().await?;
        debug!(source = ?auth.source, "resolved GitHub credential");

        let remote = CloneRemote::from_config(&config, Some(&auth))?;
        let provider = GitHubProvider::new(auth.token.clone(), config.http_timeout());

        Ok(Self {
            pipeline: Pipeline::new(config, remote, Box::new(provider)),
        })
    }
}
