//! Default values for confgen configuration.
//!
//! This module provides centralized default values used by the configuration
//! loader and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Remote name git assigns to the clone source.
pub const REMOTE: &str = "origin";

/// Branches that receive generated configs.
pub const BRANCH_PATTERN: &str = "candidate*";

/// Default branch of the variables repository.
pub const DEFAULT_BRANCH: &str = "main";

/// Directory inside the clone holding per-site variables.
pub const VARIABLES_DIR: &str = "variables";

/// Directory inside the clone receiving rendered configs.
pub const RESULTS_DIR: &str = "results";

/// Directory, relative to the config file, holding one template dir per generator.
pub const TEMPLATES_ROOT: &str = "templates";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "confgen.yaml";

pub const COMMIT_AUTHOR_NAME: &str = "confgen";
pub const COMMIT_AUTHOR_EMAIL: &str = "confgen@localhost";

/// Upper bound for a single run, in seconds.
pub const RUN_TIMEOUT_SECS: u64 = 900;

pub const LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Returns the default working directory that holds the local clone.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/confgen` (XDG Base Directory)
/// - macOS: `~/Library/Caches/confgen`
/// - Windows: `{FOLDERID_LocalAppData}\confgen`
///
/// Falls back to `.confgen-work` in the current directory if the platform
/// cache directory cannot be determined.
pub fn default_workdir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".confgen-work"))
        .join("confgen")
}
