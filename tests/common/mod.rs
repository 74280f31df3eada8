//! Shared test utilities for integration and E2E tests.
//!
//! The main fixture is [`GitRemote`]: a bare repository on disk standing in
//! for the hosted variables repository, seeded through a scratch clone.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let remote = GitRemote::new();
//!     remote.branch("candidate-1", &[(paths::ACL_HQ, "10.0.0.1;0.0.0.7\n")]);
//!     // ... test code
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::TempDir;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{paths, templates_root, write_config, GitRemote};
}

/// Variable file locations used by the built-in generators.
#[allow(dead_code)]
pub mod paths {
    pub const ACL_HQ: &str = "variables/vty_ACL/HQ/acl_ssh_dc.txt";
    pub const ACL_DC1: &str = "variables/vty_ACL/DC1/acl_ssh_dc.txt";
    pub const NTP_HQ: &str = "variables/ntp_servers/HQ/ntp_servers.txt";
    pub const ACL_HQ_OUTPUT: &str = "results/vty_ACL_HQ.txt";
    pub const NTP_HQ_OUTPUT: &str = "results/NTP_servers_HQ.txt";
}

/// The templates shipped with the crate.
#[allow(dead_code)]
pub fn templates_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Run git in `dir`, panicking with its stderr on failure. Returns stdout.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A bare remote plus a scratch clone used to seed it.
pub struct GitRemote {
    pub temp: TempDir,
    pub bare: PathBuf,
    seed: PathBuf,
}

#[allow(dead_code)]
impl GitRemote {
    /// A remote whose `main` branch holds a README.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let bare = temp.path().join("remote.git");
        let seed = temp.path().join("seed");
        fs::create_dir_all(&bare).unwrap();
        fs::create_dir_all(&seed).unwrap();

        git(&bare, &["init", "--bare"]);
        git(&seed, &["init"]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        fs::write(seed.join("README.md"), "Site variables\n").unwrap();
        git(&seed, &["add", "-A"]);
        git(&seed, &["commit", "-m", "Initial commit"]);
        git(&seed, &["remote", "add", "origin", &bare.to_string_lossy()]);
        git(&seed, &["push", "origin", "main"]);

        Self { temp, bare, seed }
    }

    pub fn url(&self) -> String {
        self.bare.to_string_lossy().to_string()
    }

    /// Create `name` from `main` with `files` committed on top, and push it.
    pub fn branch(&self, name: &str, files: &[(&str, &str)]) {
        git(&self.seed, &["checkout", "-B", name, "main"]);
        for (path, content) in files {
            let full = self.seed.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        git(&self.seed, &["add", "-A"]);
        git(&self.seed, &["commit", "--allow-empty", "-m", &format!("Variables for {}", name)]);
        git(&self.seed, &["push", "-f", "origin", name]);
        git(&self.seed, &["checkout", "main"]);
    }

    /// Subject of the newest commit on `branch` in the remote.
    pub fn last_subject(&self, branch: &str) -> String {
        git(&self.bare, &["log", "-1", "--format=%s", branch])
    }

    pub fn commit_count(&self, branch: &str) -> usize {
        git(&self.bare, &["rev-list", "--count", branch]).parse().unwrap()
    }

    /// Content of `path` at the tip of `branch` in the remote.
    pub fn file(&self, branch: &str, path: &str) -> String {
        git(&self.bare, &["show", &format!("{}:{}", branch, path)])
    }

    /// Working directory for the generation clone.
    pub fn workdir(&self) -> PathBuf {
        self.temp.path().join("work")
    }
}

/// Write a `confgen.yaml` for `remote` into `dir` and return its path.
#[allow(dead_code)]
pub fn write_config(dir: &Path, remote: &GitRemote) -> PathBuf {
    let path = dir.join("confgen.yaml");
    let yaml = format!(
        "repository:\n  url: {}\n  branch: main\nworkdir: {}\ntemplates_root: {}\nrun:\n  timeout_secs: 120\n",
        remote.url(),
        remote.workdir().display(),
        templates_root().display()
    );
    fs::write(&path, yaml).unwrap();
    path
}
