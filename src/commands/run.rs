//! Run command implementation
//!
//! Executes one generation run in the foreground:
//! 1. Lock and sync the working copy
//! 2. Enumerate candidate branches
//! 3. Generate, commit and push each branch
//! 4. Remove the working copy
//!
//! Exits non-zero if the sync fails or any branch fails.

use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use confgen::error::Error;
use confgen::orchestrator::{BranchStatus, CancelFlag, Orchestrator, RunReport};
use confgen::repository::SystemGit;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the branch glob from the config file
    #[arg(long, value_name = "GLOB")]
    pub branch_pattern: Option<String>,

    /// Run without the configured time limit
    #[arg(long)]
    pub no_timeout: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let start_time = Instant::now();
    let config_path = super::config_path(args.config);
    let mut settings = super::load_settings(&config_path)?;
    if let Some(pattern) = args.branch_pattern {
        settings.branch_pattern = pattern;
        settings.validate()?;
    }

    let cancel = CancelFlag::new();
    let timeout = if args.no_timeout {
        None
    } else {
        settings.run_timeout()
    };
    if let Some(limit) = timeout {
        // Stops the run at the next branch boundary; the thread dies with the process.
        let watchdog = cancel.clone();
        thread::spawn(move || {
            thread::sleep(limit);
            watchdog.cancel();
        });
    }

    let git = SystemGit::from_settings(&settings);
    let result = Orchestrator::new(&settings, &git)
        .with_cancel_flag(cancel)
        .run();

    let report = match result {
        Ok(report) => report,
        Err(Error::Cancelled { failures, .. }) if timeout.is_some() => {
            let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
            return Err(Error::Timeout { secs, failures }.into());
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&report);
    println!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());
    report.into_result()?;
    Ok(())
}

fn print_summary(report: &RunReport) {
    if report.branches.is_empty() {
        println!("No candidate branches found");
        return;
    }
    for outcome in &report.branches {
        match &outcome.result {
            Ok(BranchStatus::Published { commit }) => {
                println!("✅ {}: published (from {})", outcome.branch, commit)
            }
            Ok(BranchStatus::Unchanged) => println!("✅ {}: no changes", outcome.branch),
            Err(e) => println!("❌ {}: {}", outcome.branch, e),
        }
    }
}
