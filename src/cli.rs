//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// confgen - Generate per-site device configs from git-hosted variables
#[derive(Parser, Debug)]
#[command(name = "confgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one generation pass over every candidate branch
    Run(commands::run::RunArgs),

    /// Listen for push webhooks and run generation in the background
    Serve(commands::serve::ServeArgs),

    /// Render configs from an existing checkout without any git operation
    Render(commands::render::RenderArgs),

    /// List registered generators and whether their templates are available
    Generators(commands::generators::GeneratorsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Run(args) => commands::run::execute(args),
            Commands::Serve(args) => commands::serve::execute(args),
            Commands::Render(args) => commands::render::execute(args),
            Commands::Generators(args) => commands::generators::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when embedded; keep it.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
