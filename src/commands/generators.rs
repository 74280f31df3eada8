//! Generators command implementation
//!
//! Lists every registered generator and whether its template directory is
//! usable under the configured templates root.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use confgen::defaults;
use confgen::generators::{availability, Availability, GenerationPaths, BUILTIN};

/// Arguments for the generators command
#[derive(Args, Debug)]
pub struct GeneratorsArgs {
    /// Path to config file; optional, defaults apply when absent
    #[arg(short, long, value_name = "PATH", env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Templates root (overrides templates_root from the config)
    #[arg(long, value_name = "PATH")]
    pub templates: Option<PathBuf>,
}

/// Execute the generators command
pub fn execute(args: GeneratorsArgs) -> Result<()> {
    let templates_root = match (args.templates, args.config) {
        (Some(templates), _) => templates,
        (None, Some(config)) => super::load_settings(&config)?.templates_root,
        (None, None) => {
            let default_config = PathBuf::from(defaults::CONFIG_FILE);
            if default_config.exists() {
                super::load_settings(&default_config)?.templates_root
            } else {
                PathBuf::from(defaults::TEMPLATES_ROOT)
            }
        }
    };

    let paths = GenerationPaths {
        variables_root: PathBuf::from(defaults::VARIABLES_DIR),
        results_root: PathBuf::from(defaults::RESULTS_DIR),
        templates_root,
    };

    println!("Generators under {}:", paths.templates_root.display());
    for spec in BUILTIN {
        match availability(spec, &paths) {
            Availability::Ready => println!("  {:<10} ready        {}", spec.name, spec.description),
            Availability::Unavailable(reason) => {
                println!("  {:<10} unavailable  {}", spec.name, reason)
            }
        }
    }
    Ok(())
}
