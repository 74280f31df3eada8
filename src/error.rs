//! # Error Handling
//!
//! This module defines the centralized error type for `confgen`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the generation engine can report, together with a `Result<T>` alias used
//! throughout the library.
//!
//! ## Scopes
//!
//! Errors fall into two scopes, and the orchestrator treats them differently:
//!
//! - **Run-scoped**: `Sync`, `RunLocked`, `ConfigParse`. These abort the
//!   whole run before any branch is processed.
//! - **Branch-scoped**: `Validation`, `Template`, `Generator`, `Publish` and
//!   plain `GitCommand` failures raised while a branch is checked out. These
//!   are caught at the branch boundary, recorded, and the run moves on.
//!
//! `Aggregate` is produced once at the end of a run when at least one branch
//! failed. `Cancelled`, `Timeout` and `WorkerStopped` come from the background worker.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for confgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be parsed or failed validation.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A git command exited with a non-zero status.
    #[error("Git command failed: git {command}: {stderr}")]
    GitCommand { command: String, stderr: String },

    /// The working copy could not be cloned or brought up to date.
    #[error("Repository sync failed for {url}@{branch}: {message}")]
    Sync {
        url: String,
        branch: String,
        message: String,
    },

    /// A variables file is missing or malformed.
    #[error("Invalid variables file {}: {message}", file.display())]
    Validation { file: PathBuf, message: String },

    /// A template could not be loaded or rendered.
    #[error("Template error in {template}: {message}")]
    Template { template: String, message: String },

    /// A generator failed; wraps the underlying error.
    #[error("Generator {generator} failed: {source}")]
    Generator {
        generator: String,
        #[source]
        source: Box<Error>,
    },

    /// Committing or pushing generated output failed.
    #[error("Publish failed for branch {branch}: {message}")]
    Publish { branch: String, message: String },

    /// One or more branches failed during a run.
    ///
    /// Messages are kept in branch-processing order.
    #[error("{}", failures.join("; "))]
    Aggregate { failures: Vec<String> },

    /// Another process holds the run lock for this working copy.
    #[error("Run already in progress: lock held at {}", path.display())]
    RunLocked { path: PathBuf },

    /// The run stopped at a branch boundary after cancellation was requested.
    ///
    /// `failures` holds the messages of branches that failed before the stop.
    #[error(
        "Run cancelled after {completed} branch(es), {remaining} not processed{}",
        failure_suffix(failures)
    )]
    Cancelled {
        completed: usize,
        remaining: usize,
        failures: Vec<String>,
    },

    /// The run exceeded its time budget.
    #[error("Run timed out after {secs}s{}", failure_suffix(failures))]
    Timeout { secs: u64, failures: Vec<String> },

    /// The background worker is no longer accepting runs.
    #[error("Generation worker has stopped")]
    WorkerStopped,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Wrap an error raised inside a generator with the generator's name.
    pub fn generator(name: impl Into<String>, source: Error) -> Self {
        Error::Generator {
            generator: name.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `Generator` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Generator { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Branch failure messages carried by this error, in processing order.
    pub fn branch_failures(&self) -> &[String] {
        match self {
            Error::Aggregate { failures }
            | Error::Cancelled { failures, .. }
            | Error::Timeout { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Whether this error aborts the whole run rather than a single branch.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Error::Sync { .. } | Error::RunLocked { .. } | Error::ConfigParse { .. }
        )
    }
}

fn failure_suffix(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!("; {}", failures.join("; "))
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
