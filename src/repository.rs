//! # Repository Access
//!
//! The orchestrator never calls git directly. It goes through the
//! `GitOperations` trait so the run logic can be exercised with a mock that
//! records calls and injects failures, while production uses `SystemGit`,
//! a thin wrapper over the functions in [`crate::git`].
//!
//! `RepositoryHandle` owns the local clone for the duration of one run and
//! removes it when the run ends.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::branches::BranchPattern;
use crate::config::{CommitSettings, Settings};
use crate::error::Result;
use crate::git::{self, PublishOutcome};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clone `url` at `branch` into `dest`, or bring an existing clone up to date.
    fn sync(&self, url: &str, branch: &str, dest: &Path) -> Result<PathBuf>;

    fn list_remote_branches(&self, repo: &Path, pattern: &BranchPattern) -> Result<Vec<String>>;

    /// Force the local `branch` to the tip of `origin/<branch>` and check it out.
    fn checkout_tracking(&self, repo: &Path, branch: &str) -> Result<()>;

    fn current_commit_id(&self, repo: &Path) -> Result<String>;

    fn has_changes(&self, repo: &Path) -> Result<bool>;

    /// Commit all changes and push `branch`; a clean tree is a no-op.
    fn commit_and_push(&self, repo: &Path, branch: &str, message: &str) -> Result<PublishOutcome>;
}

/// `GitOperations` backed by the system `git` command.
#[derive(Debug, Clone, Default)]
pub struct SystemGit {
    author: CommitSettings,
}

impl SystemGit {
    pub fn new(author: CommitSettings) -> Self {
        Self { author }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.commit.clone())
    }
}

impl GitOperations for SystemGit {
    fn sync(&self, url: &str, branch: &str, dest: &Path) -> Result<PathBuf> {
        git::sync_repo(url, branch, dest)
    }

    fn list_remote_branches(&self, repo: &Path, pattern: &BranchPattern) -> Result<Vec<String>> {
        git::list_remote_branches(repo, pattern)
    }

    fn checkout_tracking(&self, repo: &Path, branch: &str) -> Result<()> {
        git::checkout_tracking_branch(repo, branch)
    }

    fn current_commit_id(&self, repo: &Path) -> Result<String> {
        git::current_commit_id(repo)
    }

    fn has_changes(&self, repo: &Path) -> Result<bool> {
        git::has_changes(repo)
    }

    fn commit_and_push(&self, repo: &Path, branch: &str, message: &str) -> Result<PublishOutcome> {
        git::commit_and_push(repo, branch, message, &self.author)
    }
}

/// The local clone used by one run.
///
/// The directory is removed by `cleanup()`, or on drop if cleanup was never
/// called. Removal is best-effort: failures are logged and swallowed so they
/// never mask the outcome of the run.
#[derive(Debug)]
pub struct RepositoryHandle {
    url: String,
    branch: String,
    path: PathBuf,
    cleaned: bool,
}

impl RepositoryHandle {
    pub fn new(url: impl Into<String>, branch: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            path: path.into(),
            cleaned: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.repository.url.clone(),
            settings.repository.branch.clone(),
            settings.clone_path(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The default branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the clone directory. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        if !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed working copy {}", self.path.display()),
            Err(e) => warn!(
                "Failed to remove working copy {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for RepositoryHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}
