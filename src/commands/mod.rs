//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `confgen`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `confgen` library.

pub mod completions;
pub mod generators;
pub mod render;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use confgen::config::{self, Settings};
use confgen::defaults;

/// Resolve the configuration path, falling back to `confgen.yaml`.
pub fn config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(|| PathBuf::from(defaults::CONFIG_FILE))
}

/// Load settings from `path`, failing with a readable message if it is absent.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}
