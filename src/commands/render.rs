//! Render command implementation
//!
//! Runs generators against a checkout that already exists on disk. No git
//! command is executed: nothing is cloned, committed or pushed. Useful to
//! preview output while editing variables or templates.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use confgen::config::Settings;
use confgen::defaults;
use confgen::generators::{availability, Availability, GenerationPaths, GeneratorSpec, BUILTIN};
use log::info;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to config file; optional, defaults apply when absent
    #[arg(short, long, value_name = "PATH", env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Checkout holding the variables directory
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub checkout: PathBuf,

    /// Templates root (overrides templates_root from the config)
    #[arg(long, value_name = "PATH")]
    pub templates: Option<PathBuf>,

    /// Only run this generator (repeatable); all available ones by default
    #[arg(short, long = "generator", value_name = "NAME")]
    pub generators: Vec<String>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let settings = optional_settings(args.config)?;
    let paths = generation_paths(&args.checkout, args.templates, settings.as_ref());
    let specs = select(&args.generators)?;

    let mut ran = 0;
    for spec in specs {
        match availability(&spec, &paths) {
            Availability::Ready => {}
            Availability::Unavailable(reason) if !args.generators.is_empty() => {
                anyhow::bail!("Generator {} is not available: {}", spec.name, reason);
            }
            Availability::Unavailable(reason) => {
                info!("Skipping generator {}: {}", spec.name, reason);
                continue;
            }
        }
        let generator = (spec.build)(&paths)?;
        generator
            .generate_config()
            .map_err(|e| confgen::error::Error::generator(spec.name, e))?;
        println!("✅ {}", spec.name);
        ran += 1;
    }

    if ran == 0 {
        println!("No generators available under {}", paths.templates_root.display());
    } else {
        println!("Output written to {}", paths.results_root.display());
    }
    Ok(())
}

fn optional_settings(config: Option<PathBuf>) -> Result<Option<Settings>> {
    match config {
        Some(path) => super::load_settings(&path).map(Some),
        None => {
            let path = PathBuf::from(defaults::CONFIG_FILE);
            if path.exists() {
                super::load_settings(&path).map(Some)
            } else {
                Ok(None)
            }
        }
    }
}

fn generation_paths(checkout: &Path, templates: Option<PathBuf>, settings: Option<&Settings>) -> GenerationPaths {
    let variables_dir = settings.map_or(defaults::VARIABLES_DIR, |s| s.variables_dir.as_str());
    let results_dir = settings.map_or(defaults::RESULTS_DIR, |s| s.results_dir.as_str());
    let templates_root = templates
        .or_else(|| settings.map(|s| s.templates_root.clone()))
        .unwrap_or_else(|| PathBuf::from(defaults::TEMPLATES_ROOT));

    GenerationPaths {
        variables_root: checkout.join(variables_dir),
        results_root: checkout.join(results_dir),
        templates_root,
    }
}

fn select(names: &[String]) -> Result<Vec<GeneratorSpec>> {
    if names.is_empty() {
        return Ok(BUILTIN.to_vec());
    }
    names
        .iter()
        .map(|name| {
            BUILTIN
                .iter()
                .find(|spec| spec.name == name.as_str())
                .copied()
                .ok_or_else(|| {
                    let known: Vec<&str> = BUILTIN.iter().map(|s| s.name).collect();
                    anyhow::anyhow!("Unknown generator '{}' (known: {})", name, known.join(", "))
                })
        })
        .collect()
}
