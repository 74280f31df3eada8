//! # Configuration
//!
//! This module defines `Settings`, the single configuration value that is
//! constructed once at process start and passed by reference to the
//! orchestrator, the generators and the webhook worker. No component reads
//! ambient global state.
//!
//! Settings are loaded from a YAML file (`confgen.yaml` by default):
//!
//! ```yaml
//! repository:
//!   url: https://example.com/network/config_templates.git
//!   branch: main
//! workdir: /var/lib/confgen
//! templates_root: templates
//! branch_pattern: "candidate*"
//! commit:
//!   author_name: confgen
//!   author_email: confgen@localhost
//! run:
//!   timeout_secs: 900
//! server:
//!   listen: 0.0.0.0:8080
//! ```
//!
//! Only `repository.url` is required. Relative `workdir` and `templates_root`
//! paths are resolved against the directory containing the configuration
//! file, so a deployment can ship its templates next to its config.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Remote repository holding the variables and receiving generated configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    /// Clone URL (https, ssh, or a local path).
    pub url: String,
    /// Default branch; synced first and the only branch webhooks react to.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Local directory name for the clone. Derived from the URL when absent.
    #[serde(default)]
    pub name: Option<String>,
}

/// Identity used for generated commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitSettings {
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for CommitSettings {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    /// Upper bound for one run; `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub repository: RepositorySettings,
    /// Parent directory of the local clone.
    #[serde(default = "defaults::default_workdir")]
    pub workdir: PathBuf,
    /// Plugin root: one template directory per generator.
    #[serde(default = "default_templates_root")]
    pub templates_root: PathBuf,
    /// Glob selecting the remote branches that receive generated configs.
    #[serde(default = "default_branch_pattern")]
    pub branch_pattern: String,
    /// Variables directory, relative to the clone root.
    #[serde(default = "default_variables_dir")]
    pub variables_dir: String,
    /// Results directory, relative to the clone root.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    #[serde(default)]
    pub commit: CommitSettings,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Settings for `url` with every other field at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            repository: RepositorySettings {
                url: url.into(),
                branch: default_branch(),
                name: None,
            },
            workdir: defaults::default_workdir(),
            templates_root: default_templates_root(),
            branch_pattern: default_branch_pattern(),
            variables_dir: default_variables_dir(),
            results_dir: default_results_dir(),
            commit: CommitSettings::default(),
            run: RunSettings::default(),
            server: ServerSettings::default(),
        }
    }

    /// Directory name of the local clone.
    ///
    /// Uses `repository.name` when set, otherwise the last path segment of
    /// the URL without a trailing `.git`.
    pub fn repo_name(&self) -> String {
        if let Some(name) = self.repository.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        repo_name_from_url(&self.repository.url)
    }

    /// Location of the local clone.
    pub fn clone_path(&self) -> PathBuf {
        self.workdir.join(self.repo_name())
    }

    pub fn variables_path(&self) -> PathBuf {
        self.clone_path().join(&self.variables_dir)
    }

    pub fn results_path(&self) -> PathBuf {
        self.clone_path().join(&self.results_dir)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        match self.run.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.repository.url.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "repository.url is empty".to_string(),
                hint: Some("set repository.url to the variables repository clone URL".to_string()),
            });
        }
        if self.repository.branch.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "repository.branch is empty".to_string(),
                hint: Some(format!("the usual value is '{}'", defaults::DEFAULT_BRANCH)),
            });
        }
        let name = self.repo_name();
        if name.is_empty() {
            return Err(Error::ConfigParse {
                message: format!(
                    "cannot derive a clone directory name from '{}'",
                    self.repository.url
                ),
                hint: Some("set repository.name explicitly".to_string()),
            });
        }
        if !is_plain_dir_name(&name) {
            return Err(Error::ConfigParse {
                message: format!("clone directory name '{}' is not a plain directory name", name),
                hint: Some(
                    "repository.name must be a single path segment other than '.' or '..'".to_string(),
                ),
            });
        }
        if self.branch_pattern.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "branch_pattern is empty".to_string(),
                hint: Some(format!("the usual value is '{}'", defaults::BRANCH_PATTERN)),
            });
        }
        glob::Pattern::new(&self.branch_pattern).map_err(|e| Error::ConfigParse {
            message: format!("branch_pattern '{}' is not a valid glob: {}", self.branch_pattern, e),
            hint: None,
        })?;
        Ok(())
    }

    /// Resolve relative filesystem paths against `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        if self.workdir.is_relative() {
            self.workdir = base.join(&self.workdir);
        }
        if self.templates_root.is_relative() {
            self.templates_root = base.join(&self.templates_root);
        }
    }
}

/// Parse and validate settings from a YAML string.
///
/// Relative paths are left untouched; `from_file` resolves them.
pub fn parse(yaml_content: &str) -> Result<Settings> {
    let settings: Settings = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: None,
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file, resolving relative paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut settings = parse(&content)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    settings.resolve_relative(base);
    Ok(settings)
}

// The clone is deleted after every run, so it must stay directly under workdir.
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

fn default_branch() -> String {
    defaults::DEFAULT_BRANCH.to_string()
}

fn default_author_name() -> String {
    defaults::COMMIT_AUTHOR_NAME.to_string()
}

fn default_author_email() -> String {
    defaults::COMMIT_AUTHOR_EMAIL.to_string()
}

fn default_timeout_secs() -> u64 {
    defaults::RUN_TIMEOUT_SECS
}

fn default_listen() -> String {
    defaults::LISTEN_ADDR.to_string()
}

fn default_templates_root() -> PathBuf {
    PathBuf::from(defaults::TEMPLATES_ROOT)
}

fn default_branch_pattern() -> String {
    defaults::BRANCH_PATTERN.to_string()
}

fn default_variables_dir() -> String {
    defaults::VARIABLES_DIR.to_string()
}

fn default_results_dir() -> String {
    defaults::RESULTS_DIR.to_string()
}
