//! Test utilities for lapo integration tests

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{CreatePrCall, MockPlatformService, MockProvider};

use lapo::cache::CloneRemote;
use lapo::config::Config;
use lapo::platform::parse_repo_url;
use lapo::types::RepoRef;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git with a fixed identity, panicking on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A bare "remote" repository served through the mirror remote, plus a
/// scratch clone used to author commits.
///
/// Layout inside the temp dir:
/// - `mirror/<owner>/<repo>.git` - the bare remote
/// - `scratch/` - working clone used to create commits and patches
/// - `cache/` - cache root for the code under test
pub struct TempRemote {
    pub temp: TempDir,
    pub repo_url: String,
    pub repo: RepoRef,
}

impl TempRemote {
    /// Remote for `https://github.com/<owner>/<repo>` with one commit on main
    pub fn new(owner: &str, name: &str) -> Self {
        let temp = TempDir::new().expect("tempdir");
        let repo_url = format!("https://github.com/{owner}/{name}");
        let repo = parse_repo_url(&repo_url).expect("valid url");

        let bare = temp.path().join("mirror").join(owner).join(format!("{name}.git"));
        std::fs::create_dir_all(&bare).unwrap();
        git(&bare, &["init", "--bare", "-b", "main"]);

        let scratch = temp.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        git(&scratch, &["init", "-b", "main"]);
        git(&scratch, &["remote", "add", "origin", bare.to_str().unwrap()]);

        let remote = Self {
            temp,
            repo_url,
            repo,
        };
        remote.commit_on("main", &[("README.md", "# docs\n")], "initial commit");
        remote
    }

    pub fn mirror_root(&self) -> PathBuf {
        self.temp.path().join("mirror")
    }

    pub fn bare_path(&self) -> PathBuf {
        self.mirror_root()
            .join(&self.repo.owner)
            .join(format!("{}.git", self.repo.repo))
    }

    pub fn scratch(&self) -> PathBuf {
        self.temp.path().join("scratch")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    /// Config pointing the cache at this remote
    pub fn config(&self) -> Config {
        Config {
            cache_dir: self.cache_dir(),
            mirror_root: Some(self.mirror_root()),
            clone_depth: 10,
            git_timeout_secs: 60,
            ..Config::default()
        }
    }

    /// Clone remote resolving to the bare repository
    pub fn clone_remote(&self) -> CloneRemote {
        CloneRemote::Mirror {
            root: self.mirror_root(),
        }
    }

    /// Commit `files` on `branch` (created from main if new) and push it.
    pub fn commit_on(&self, branch: &str, files: &[(&str, &str)], message: &str) {
        let scratch = self.scratch();
        let has_main = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "refs/heads/main"])
            .current_dir(&scratch)
            .status()
            .unwrap()
            .success();
        if has_main && branch != "main" {
            let exists = Command::new("git")
                .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
                .current_dir(&scratch)
                .status()
                .unwrap()
                .success();
            if exists {
                git(&scratch, &["checkout", branch]);
            } else {
                git(&scratch, &["checkout", "-b", branch, "main"]);
            }
        }

        for (path, content) in files {
            let full = scratch.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }
        git(&scratch, &["add", "-A"]);
        git(&scratch, &["commit", "-m", message]);
        git(&scratch, &["push", "-f", "origin", branch]);

        if has_main && branch != "main" {
            git(&scratch, &["checkout", "main"]);
        }
    }

    /// Unified diff that writes `files` on top of main, without committing it.
    pub fn make_patch(&self, files: &[(&str, &str)]) -> String {
        let scratch = self.scratch();
        git(&scratch, &["checkout", "main"]);
        for (path, content) in files {
            let full = scratch.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }
        git(&scratch, &["add", "-A"]);
        let patch = git(&scratch, &["diff", "--cached"]);
        git(&scratch, &["reset", "--hard", "HEAD"]);
        git(&scratch, &["clean", "-fd"]);
        patch
    }

    /// Contents of `path` on a branch of the bare remote
    pub fn remote_file(&self, branch: &str, path: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["show", &format!("{branch}:{path}")])
            .current_dir(self.bare_path())
            .output()
            .unwrap();
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Whether the bare remote has `branch`
    pub fn remote_has_branch(&self, branch: &str) -> bool {
        Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .current_dir(self.bare_path())
            .status()
            .unwrap()
            .success()
    }

    /// Mock platform bound to this repository
    pub fn mock_platform(&self) -> MockPlatformService {
        MockPlatformService::new(self.repo.clone())
    }
}

/// Drop `index <sha>..<sha>` lines so diffs from different trees compare equal.
pub fn strip_index_lines(diff: &str) -> String {
    diff.lines()
        .filter(|line| !line.starts_with("index "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Current branch of a working copy
pub fn current_branch(dir: &Path) -> String {
    git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
        .trim()
        .to_string()
}
