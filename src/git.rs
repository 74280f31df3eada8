//! Git plumbing via the system `git` binary.
//!
//! Using the system command means authentication works the way it does for
//! an operator at a shell:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Only the handful of operations the generation run needs are provided.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::branches::{self, BranchPattern};
use crate::config::CommitSettings;
use crate::defaults::REMOTE;
use crate::error::{Error, Result};

/// What `commit_and_push` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A commit was created and pushed.
    Pushed,
    /// The working tree was clean; nothing was committed or pushed.
    NoChanges,
}

/// Run `git` with `args`, inside `repo` when given, and return trimmed stdout.
pub fn run_git(args: &[&str], repo: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    if let Some(repo) = repo {
        cmd.arg("-C").arg(repo);
    }
    cmd.args(args);
    debug!("git {}", args.join(" "));

    let output = cmd.output().map_err(|e| Error::GitCommand {
        command: args.join(" "),
        stderr: format!("failed to run git: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::GitCommand {
            command: args.join(" "),
            stderr: detail,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Clone or update the working copy at `dest` so it matches `origin/<branch>`.
///
/// An existing working copy is fetched with pruning and hard-reset, throwing
/// away any local drift. Otherwise `dest` is created and `branch` is cloned
/// into it, followed by a fetch so every remote branch ref is present for
/// enumeration. Any git failure is reported as `Error::Sync`.
pub fn sync_repo(url: &str, branch: &str, dest: &Path) -> Result<PathBuf> {
    let to_sync_error = |e: Error| Error::Sync {
        url: url.to_string(),
        branch: branch.to_string(),
        message: sync_failure_message(&e),
    };

    if dest.join(".git").exists() {
        info!("Updating existing working copy at {}", dest.display());
        let remote_ref = format!("{}/{}", REMOTE, branch);
        run_git(&["fetch", "--all", "--prune"], Some(dest)).map_err(to_sync_error)?;
        run_git(&["checkout", branch], Some(dest)).map_err(to_sync_error)?;
        run_git(&["reset", "--hard", &remote_ref], Some(dest)).map_err(to_sync_error)?;
    } else {
        fs::create_dir_all(dest).map_err(|e| Error::Sync {
            url: url.to_string(),
            branch: branch.to_string(),
            message: format!("cannot create {}: {}", dest.display(), e),
        })?;
        info!("Cloning {} (branch {}) into {}", url, branch, dest.display());
        let dest_str = dest.to_string_lossy();
        run_git(&["clone", "--branch", branch, url, &dest_str], None).map_err(to_sync_error)?;
        run_git(&["fetch", "--all", "--prune"], Some(dest)).map_err(to_sync_error)?;
    }

    Ok(dest.to_path_buf())
}

// Auth failures get a hint since they are the usual cause on a fresh host.
fn sync_failure_message(err: &Error) -> String {
    let message = match err {
        Error::GitCommand { command, stderr } => format!("git {}: {}", command, stderr),
        other => other.to_string(),
    };
    if message.contains("Authentication failed")
        || message.contains("Permission denied")
        || message.contains("Could not read from remote repository")
    {
        format!(
            "{}\nMake sure the service account can reach the repository \
            (SSH key in ssh-agent, credential helper, or access token).",
            message
        )
    } else {
        message
    }
}

/// Remote branches under `origin/` matching `pattern`, without the prefix.
pub fn list_remote_branches(repo: &Path, pattern: &BranchPattern) -> Result<Vec<String>> {
    let list_arg = format!("{}/{}", REMOTE, pattern.as_str());
    let output = run_git(&["branch", "-r", "--list", &list_arg], Some(repo))?;
    Ok(branches::parse_remote_listing(&output, REMOTE, pattern))
}

/// Point local `branch` at `origin/<branch>` and check it out (`checkout -B`).
pub fn checkout_tracking_branch(repo: &Path, branch: &str) -> Result<()> {
    let remote_ref = format!("{}/{}", REMOTE, branch);
    run_git(&["checkout", "-B", branch, &remote_ref], Some(repo))?;
    Ok(())
}

/// Abbreviated id of the commit at HEAD.
pub fn current_commit_id(repo: &Path) -> Result<String> {
    run_git(&["rev-parse", "--short", "HEAD"], Some(repo))
}

/// Whether the working tree has any change, staged or not, including untracked files.
pub fn has_changes(repo: &Path) -> Result<bool> {
    let status = run_git(&["status", "--porcelain"], Some(repo))?;
    Ok(!status.trim().is_empty())
}

/// Stage everything, commit with `message` as `author`, and push `branch`.
///
/// A clean tree is a no-op: no empty commit is created and nothing is pushed.
/// Failures of add, commit or push are reported as `Error::Publish`.
pub fn commit_and_push(
    repo: &Path,
    branch: &str,
    message: &str,
    author: &CommitSettings,
) -> Result<PublishOutcome> {
    let to_publish_error = |e: Error| Error::Publish {
        branch: branch.to_string(),
        message: e.to_string(),
    };

    if !has_changes(repo).map_err(to_publish_error)? {
        info!("No changes on {}, skipping commit and push", branch);
        return Ok(PublishOutcome::NoChanges);
    }

    let name = format!("user.name={}", author.author_name);
    let email = format!("user.email={}", author.author_email);
    run_git(&["add", "-A"], Some(repo)).map_err(to_publish_error)?;
    run_git(
        &["-c", &name, "-c", &email, "commit", "-m", message],
        Some(repo),
    )
    .map_err(to_publish_error)?;
    run_git(&["push", REMOTE, branch], Some(repo)).map_err(to_publish_error)?;
    info!("Pushed generated configs to {}/{}", REMOTE, branch);

    Ok(PublishOutcome::Pushed)
}
