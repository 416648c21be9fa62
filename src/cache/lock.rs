//! Per-repository advisory lock.
//!
//! Concurrent runs against the same repository would interleave checkouts in
//! the shared working copy, so every cache operation happens while holding an
//! exclusive lock on `<cache_root>/<hash_key>.lock`.

use crate::error::{Error, Result};
use crate::types::RepoRef;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Guard proving exclusive access to one cache entry. Released on drop.
#[derive(Debug)]
pub struct CacheLock {
    repo: RepoRef,
    repo_url: String,
    hash_key: String,
    local_path: PathBuf,
    _file: File,
}

impl CacheLock {
    /// Repository the lock covers
    pub const fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Repository URL as given by the caller
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Cache key of the locked entry
    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// Working copy location of the locked entry
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

pub(super) struct LockTarget {
    pub repo: RepoRef,
    pub repo_url: String,
    pub hash_key: String,
    pub local_path: PathBuf,
    pub lock_path: PathBuf,
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| Error::Lock(format!("failed to open {}: {e}", path.display())))
}

/// Block (off the async runtime) until the lock is acquired.
pub(super) async fn acquire(target: LockTarget) -> Result<CacheLock> {
    tokio::task::spawn_blocking(move || {
        let file = open_lock_file(&target.lock_path)?;
        debug!(key = %target.hash_key, "waiting for cache lock");
        file.lock_exclusive().map_err(|e| {
            Error::Lock(format!("failed to lock {}: {e}", target.lock_path.display()))
        })?;
        debug!(key = %target.hash_key, "acquired cache lock");
        Ok(CacheLock {
            repo: target.repo,
            repo_url: target.repo_url,
            hash_key: target.hash_key,
            local_path: target.local_path,
            _file: file,
        })
    })
    .await
    .map_err(|e| Error::Internal(format!("lock task failed: {e}")))?
}

/// Acquire the lock only if nobody holds it.
pub(super) fn try_acquire(target: LockTarget) -> Result<Option<CacheLock>> {
    let file = open_lock_file(&target.lock_path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(CacheLock {
            repo: target.repo,
            repo_url: target.repo_url,
            hash_key: target.hash_key,
            local_path: target.local_path,
            _file: file,
        })),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
        Err(e) => Err(Error::Lock(format!(
            "failed to lock {}: {e}",
            target.lock_path.display()
        ))),
    }
}
