//! Serve command implementation
//!
//! Starts the webhook listener and the background generation worker. Runs
//! triggered by webhooks execute one at a time; their outcome is only
//! visible in the logs and in the repository history.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use confgen::webhook::{self, AppState};
use confgen::worker::{orchestrator_job, GenerationWorker};
use log::info;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "CONFGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides server.listen)
    #[arg(short, long, value_name = "ADDR", env = "CONFGEN_LISTEN")]
    pub listen: Option<String>,
}

/// Execute the serve command
pub fn execute(args: ServeArgs) -> Result<()> {
    let config_path = super::config_path(args.config);
    let mut settings = super::load_settings(&config_path)?;
    if let Some(listen) = args.listen {
        settings.server.listen = listen;
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: confgen::config::Settings) -> Result<()> {
    let settings = Arc::new(settings);

    let job = orchestrator_job(settings.clone());
    let (worker, _handle) = GenerationWorker::spawn(job, settings.run_timeout());

    let app = webhook::router(AppState::new(&settings.repository.branch, worker));
    let listener = tokio::net::TcpListener::bind(&settings.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.listen))?;
    info!(
        "Listening on {} for pushes to {}",
        settings.server.listen, settings.repository.branch
    );

    axum::serve(listener, app)
        .await
        .context("Webhook server failed")?;
    Ok(())
}
