//! Configuration loaded from `~/.config/lapo/config.toml`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name for lapo under the platform config/cache dirs.
const APP_DIR: &str = "lapo";

/// Filename for the configuration file.
const CONFIG_FILE: &str = "config.toml";

/// Identity used for commits created by the stager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitIdentity {
    /// `user.name` for commits
    pub author_name: String,
    /// `user.email` for commits
    pub author_email: String,
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self {
            author_name: "lapo-bot".to_string(),
            author_email: "lapo-bot@users.noreply.github.com".to_string(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for cached working copies
    pub cache_dir: PathBuf,
    /// Trunk branch PRs are cut from and opened against
    pub trunk_branch: String,
    /// History depth for clones and fetches
    pub clone_depth: u32,
    /// Context lines on each side of a change in diff hunks
    pub diff_context: u32,
    /// Prefix for generated branch names
    pub branch_prefix: String,
    /// Prefix prepended to every PR title
    pub title_prefix: String,
    /// Deadline for a single git invocation
    pub git_timeout_secs: u64,
    /// Deadline for a single HTTP request
    pub http_timeout_secs: u64,
    /// Clone from `<mirror_root>/<owner>/<repo>.git` instead of the host
    pub mirror_root: Option<PathBuf>,
    /// Commit identity
    pub commit: CommitIdentity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            trunk_branch: "main".to_string(),
            clone_depth: 50,
            diff_context: 32,
            branch_prefix: "lapo-docs-".to_string(),
            title_prefix: "LapoDocs: ".to_string(),
            git_timeout_secs: 300,
            http_timeout_secs: 30,
            mirror_root: None,
            commit: CommitIdentity::default(),
        }
    }
}

impl Config {
    /// Deadline for git invocations
    pub const fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Deadline for HTTP requests
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Default cache root: `~/.cache/lapo/repos`, or the temp dir when no cache dir exists.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("repos")
}

/// Default config path: `~/.config/lapo/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load configuration from disk.
///
/// Returns defaults if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    if config.trunk_branch.trim().is_empty() {
        return Err(Error::Config(format!(
            "{}: trunk_branch must not be empty",
            path.display()
        )));
    }

    Ok(config)
}
