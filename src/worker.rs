//! Background generation worker.
//!
//! The webhook handler must acknowledge immediately, and runs must never
//! overlap on the shared working copy. Both are handled by a single consumer
//! task reading from a queue of capacity one:
//!
//! - nothing running: the trigger is queued and picked up at once
//! - a run in progress: one trigger waits behind it
//! - a trigger already waiting: the new one is merged into it, since the
//!   pending run syncs the latest repository state anyway
//!
//! Runs execute on tokio's blocking pool because every step shells out to git.
//! With a timeout configured, an overrunning run has its [`CancelFlag`] set
//! and stops at the next branch boundary; the worker waits for it to finish
//! cleaning up before taking the next trigger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::orchestrator::{CancelFlag, Orchestrator, RunReport};
use crate::repository::SystemGit;

/// One generation run, executed synchronously on the blocking pool.
pub type RunJob = Arc<dyn Fn(CancelFlag) -> Result<RunReport> + Send + Sync>;

/// A job running the orchestrator against the system `git` for `settings`.
pub fn orchestrator_job(settings: Arc<Settings>) -> RunJob {
    Arc::new(move |cancel| {
        let git = SystemGit::from_settings(&settings);
        // Bound to a local so the orchestrator's borrow of `git` ends first.
        let result = Orchestrator::new(&settings, &git)
            .with_cancel_flag(cancel)
            .run();
        result
    })
}

/// Why a run was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub reason: String,
}

impl Trigger {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The trigger will start a run.
    Queued,
    /// A run was already pending; this trigger was merged into it.
    Coalesced,
}

/// Counters describing finished runs.
#[derive(Debug, Default)]
pub struct WorkerStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl WorkerStats {
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Runs that failed, including timed out ones.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub fn finished(&self) -> u64 {
        self.succeeded() + self.failed()
    }
}

/// Handle for submitting triggers. Cheap to clone.
#[derive(Clone)]
pub struct GenerationWorker {
    sender: mpsc::Sender<Trigger>,
    stats: Arc<WorkerStats>,
}

impl GenerationWorker {
    /// Start the consumer task. Must be called from within a tokio runtime.
    ///
    /// `timeout` of `None` lets runs take as long as they need.
    pub fn spawn(job: RunJob, timeout: Option<Duration>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(1);
        let stats = Arc::new(WorkerStats::default());
        let handle = tokio::spawn(consume(receiver, job, timeout, stats.clone()));
        (Self { sender, stats }, handle)
    }

    /// Request a run without waiting for it.
    pub fn submit(&self, trigger: Trigger) -> Result<SubmitOutcome> {
        match self.sender.try_send(trigger) {
            Ok(()) => Ok(SubmitOutcome::Queued),
            Err(TrySendError::Full(trigger)) => {
                info!("Run already pending, merging trigger: {}", trigger.reason);
                Ok(SubmitOutcome::Coalesced)
            }
            Err(TrySendError::Closed(_)) => Err(Error::WorkerStopped),
        }
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }
}

async fn consume(
    mut receiver: mpsc::Receiver<Trigger>,
    job: RunJob,
    timeout: Option<Duration>,
    stats: Arc<WorkerStats>,
) {
    while let Some(trigger) = receiver.recv().await {
        info!("Starting generation run: {}", trigger.reason);
        let outcome = execute(job.clone(), timeout).await;

        match outcome.and_then(RunReport::into_result) {
            Ok(report) => {
                info!(
                    "Generation run succeeded ({} branch(es))",
                    report.branches.len()
                );
                stats.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                if matches!(e, Error::Timeout { .. }) {
                    stats.timed_out.fetch_add(1, Ordering::Relaxed);
                }
                error!("Generation run failed: {}", e);
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
    info!("Generation worker stopped");
}

async fn execute(job: RunJob, timeout: Option<Duration>) -> Result<RunReport> {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || job(flag));

    let joined = match timeout {
        None => task.await,
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    "Run exceeded {}s, cancelling at the next branch boundary",
                    limit.as_secs()
                );
                cancel.cancel();
                // The run still owns the working copy until it returns.
                let failures = match task.await {
                    Ok(Ok(report)) => report.failure_messages(),
                    Ok(Err(e)) => e.branch_failures().to_vec(),
                    Err(e) => {
                        error!("Generation run panicked after cancellation: {}", e);
                        Vec::new()
                    }
                };
                return Err(Error::Timeout {
                    secs: limit.as_secs(),
                    failures,
                });
            }
        },
    };

    joined.unwrap_or_else(|e| {
        Err(Error::Io(std::io::Error::other(format!(
            "generation run panicked: {}",
            e
        ))))
    })
}
