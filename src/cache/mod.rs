//! Long-lived cache of repository working copies.
//!
//! Each repository gets one shallow clone at `<cache_root>/<hash_key>`, where
//! the key is derived only from the repository's canonical URL. Callers take
//! a [`CacheLock`] first and then [`RepoCache::ensure`] the branches they need.

mod lock;

pub use lock::CacheLock;

use crate::auth::GitHubAuthConfig;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::platform::{authenticated_url_for, parse_repo_url};
use crate::types::{CacheEntry, RepoRef};
use lock::LockTarget;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Length of the hex cache key.
const HASH_KEY_LEN: usize = 16;

/// Where clones are fetched from
#[derive(Clone)]
pub enum CloneRemote {
    /// The code host, authenticated by embedding the token into the URL
    Authenticated {
        /// Access token
        token: String,
    },
    /// Bare repositories laid out as `<root>/<owner>/<repo>.git`
    Mirror {
        /// Absolute mirror root
        root: PathBuf,
    },
}

impl std::fmt::Debug for CloneRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated { .. } => f.write_str("Authenticated { .. }"),
            Self::Mirror { root } => f.debug_struct("Mirror").field("root", root).finish(),
        }
    }
}

impl CloneRemote {
    /// Pick the remote for a config: the mirror if configured, else the host.
    ///
    /// Fails with [`Error::MissingCredential`] when the host is needed and no
    /// token is available.
    pub fn from_config(config: &Config, auth: Option<&GitHubAuthConfig>) -> Result<Self> {
        if let Some(root) = &config.mirror_root {
            return Ok(Self::Mirror { root: root.clone() });
        }
        auth.map(|a| Self::Authenticated {
            token: a.token.clone(),
        })
        .ok_or(Error::MissingCredential)
    }

    /// URL passed to `git clone` / stored as `origin`
    pub fn url_for(&self, repo: &RepoRef) -> Result<String> {
        match self {
            Self::Authenticated { token } => {
                if token.trim().is_empty() {
                    return Err(Error::MissingCredential);
                }
                Ok(authenticated_url_for(repo, token))
            }
            Self::Mirror { root } => {
                let path = root.join(&repo.owner).join(format!("{}.git", repo.repo));
                Url::from_file_path(&path)
                    .map(String::from)
                    .map_err(|()| {
                        Error::Config(format!(
                            "mirror_root must be an absolute path: {}",
                            root.display()
                        ))
                    })
            }
        }
    }
}

/// Deterministic cache key for a repository.
pub fn hash_key(repo: &RepoRef) -> String {
    let digest = Sha256::digest(repo.canonical().as_bytes());
    let hex = format!("{digest:x}");
    hex[..HASH_KEY_LEN].to_string()
}

/// Working copy path for a repository URL under `root`. Does not touch the filesystem.
pub fn entry_path(root: &Path, repo_url: &str) -> Result<PathBuf> {
    let repo = parse_repo_url(repo_url)?;
    Ok(root.join(hash_key(&repo)))
}

/// Cache of shallow working copies keyed by repository
#[derive(Debug, Clone)]
pub struct RepoCache {
    root: PathBuf,
    remote: CloneRemote,
    trunk: String,
    depth: u32,
    git_timeout: Duration,
}

impl RepoCache {
    /// Cache rooted at `config.cache_dir`
    pub fn new(config: &Config, remote: CloneRemote) -> Self {
        Self {
            root: config.cache_dir.clone(),
            remote,
            trunk: config.trunk_branch.clone(),
            depth: config.clone_depth.max(1),
            git_timeout: config.git_timeout(),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Trunk branch clones are made from
    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    /// History depth for clones and fetches
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Working copy path for a repository URL. Does not touch the filesystem.
    pub fn entry_path(&self, repo_url: &str) -> Result<PathBuf> {
        entry_path(&self.root, repo_url)
    }

    /// Take the exclusive lock for a repository, waiting for other holders.
    pub async fn lock(&self, repo_url: &str) -> Result<CacheLock> {
        let target = self.lock_target(repo_url)?;
        lock::acquire(target).await
    }

    /// Take the lock only if it is free.
    pub fn try_lock(&self, repo_url: &str) -> Result<Option<CacheLock>> {
        let target = self.lock_target(repo_url)?;
        lock::try_acquire(target)
    }

    fn lock_target(&self, repo_url: &str) -> Result<LockTarget> {
        let repo = parse_repo_url(repo_url)?;
        let key = hash_key(&repo);
        std::fs::create_dir_all(&self.root)?;
        Ok(LockTarget {
            local_path: self.root.join(&key),
            lock_path: self.root.join(format!("{key}.lock")),
            repo,
            repo_url: repo_url.to_string(),
            hash_key: key,
        })
    }

    /// Make sure the locked repository is cloned, clean, has `branches`
    /// fetched and the first of them checked out.
    ///
    /// An empty `branches` means the trunk branch.
    pub async fn ensure(&self, lock: &CacheLock, branches: &[String]) -> Result<CacheEntry> {
        let path = lock.local_path().to_path_buf();
        let url = self.remote.url_for(lock.repo())?;

        let mut wanted: Vec<String> = Vec::new();
        for branch in branches {
            if !wanted.contains(branch) {
                wanted.push(branch.clone());
            }
        }
        if wanted.is_empty() {
            wanted.push(self.trunk.clone());
        }

        if self.is_working_copy(&path).await? {
            self.refresh(&path, &url).await?;
        } else {
            if path.exists() {
                warn!(path = %path.display(), "cache entry is not a usable git repository, recloning");
                std::fs::remove_dir_all(&path)?;
            }
            self.clone_into(&path, &url).await?;
        }

        let git = Git::new(&path, self.git_timeout);
        for branch in &wanted {
            self.fetch_branch(&git, branch).await?;
        }

        let active = wanted[0].as_str();
        let remote_ref = format!("refs/remotes/origin/{active}");
        git.run(&["checkout", "-B", active, remote_ref.as_str(), "--"])
            .await?;

        info!(repo = %lock.repo(), key = lock.hash_key(), branch = %active, "cache entry ready");
        Ok(CacheEntry {
            repo_url: lock.repo_url().to_string(),
            hash_key: lock.hash_key().to_string(),
            local_path: path,
            fetched_branches: wanted,
        })
    }

    async fn clone_into(&self, path: &Path, url: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        debug!(path = %path.display(), depth = self.depth, "cloning");
        let git = Git::new(&self.root, self.git_timeout);
        let depth = self.depth.to_string();
        let target = path.to_string_lossy();

        let result = git
            .run(&[
                "clone",
                "--depth",
                depth.as_str(),
                "--single-branch",
                "--branch",
                self.trunk.as_str(),
                url,
                target.as_ref(),
            ])
            .await;

        if let Err(e) = result {
            if path.exists() {
                warn!(path = %path.display(), "removing partial clone");
                if let Err(rm) = std::fs::remove_dir_all(path) {
                    warn!(error = %rm, "failed to remove partial clone");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn is_working_copy(&self, path: &Path) -> Result<bool> {
        if !path.join(".git").is_dir() {
            return Ok(false);
        }
        Git::new(path, self.git_timeout)
            .succeeds(&["rev-parse", "--git-dir"])
            .await
    }

    async fn refresh(&self, path: &Path, url: &str) -> Result<()> {
        debug!(path = %path.display(), "refreshing cache entry");
        let git = Git::new(path, self.git_timeout);
        // The token may have rotated since the clone.
        git.run(&["remote", "set-url", "origin", url]).await?;
        git.run(&["reset", "--hard"]).await?;
        git.run(&["clean", "-fd"]).await?;
        Ok(())
    }

    async fn fetch_branch(&self, git: &Git, branch: &str) -> Result<()> {
        // Exit status 1 means no refspec is configured yet.
        let registered = match git
            .run(&["config", "--get-all", "remote.origin.fetch"])
            .await
        {
            Ok(refspecs) => refspecs,
            Err(Error::Vcs { .. }) => String::new(),
            Err(e) => return Err(e),
        };
        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        if !registered.lines().any(|line| line.trim() == refspec) {
            git.run(&["remote", "set-branches", "--add", "origin", branch])
                .await?;
        }

        debug!(branch, "fetching");
        let depth = self.depth.to_string();
        git.run(&["fetch", "--depth", depth.as_str(), "origin", refspec.as_str()])
            .await?;
        Ok(())
    }
}
