//! # Generation Run
//!
//! The `Orchestrator` drives one generation run as a small state machine:
//!
//! ```text
//! Init ──sync ok──> Synced ──> Branch(0) ──> … ──> Branch(n-1) ──> Done
//!   └──sync failed──> Failed
//! ```
//!
//! 1. **Init**: take the run lock, clone or update the working copy. A sync
//!    failure ends the run immediately; no branch is attempted.
//! 2. **Synced**: list the remote branches matching the configured pattern
//!    and build the generator registry once for the whole run.
//! 3. **Branch(i)**: check out the tracking branch, note its commit id, run
//!    every generator in registration order, then commit and push if the
//!    tree changed. Any failure is recorded against that branch and the loop
//!    moves on to the next one.
//! 4. **Done**: the per-branch outcomes are returned as a [`RunReport`];
//!    [`RunReport::into_result`] folds failures into `Error::Aggregate`.
//!
//! Whatever happens after the lock is taken, the working copy is removed
//! before `run` returns. Branches are processed strictly one at a time since
//! they all share that single working copy. Cancellation is only observed
//! between branches, never in the middle of one.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::branches::BranchPattern;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::generators::GeneratorRegistry;
use crate::git::PublishOutcome;
use crate::lock::RunLock;
use crate::repository::{GitOperations, RepositoryHandle};

/// Cooperative cancellation shared between a run and whoever supervises it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Synced,
    /// Processing the branch at this index.
    Branch(usize),
    Done,
    Failed,
}

/// What happened to a branch whose processing succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchStatus {
    /// Generated output was committed and pushed. `commit` is the branch tip
    /// the output was generated from.
    Published { commit: String },
    /// Generation produced no change; nothing was committed.
    Unchanged,
}

#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: String,
    pub result: std::result::Result<BranchStatus, Error>,
}

impl BranchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// `branch <name>: <error>` for failed branches.
    pub fn failure_message(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| format!("branch {}: {}", self.branch, e))
    }
}

/// Per-branch outcomes of one run, in processing order.
#[derive(Debug)]
pub struct RunReport {
    pub branches: Vec<BranchOutcome>,
    pub final_state: RunState,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.branches.iter().filter(|o| !o.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// One `branch <name>: <error>` message per failed branch.
    pub fn failure_messages(&self) -> Vec<String> {
        failure_messages(&self.branches)
    }

    /// `Ok(self)` when every branch succeeded, otherwise `Error::Aggregate`
    /// with one message per failed branch.
    pub fn into_result(self) -> Result<RunReport> {
        let failures = self.failure_messages();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::Aggregate { failures })
        }
    }
}

fn failure_messages(outcomes: &[BranchOutcome]) -> Vec<String> {
    outcomes.iter().filter_map(BranchOutcome::failure_message).collect()
}

type RegistryFactory<'a> = Box<dyn Fn(&Settings) -> GeneratorRegistry + 'a>;

/// Runs one generation pass over every matching branch.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    git: &'a dyn GitOperations,
    registry_factory: RegistryFactory<'a>,
    cancel: CancelFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: &'a Settings, git: &'a dyn GitOperations) -> Self {
        Self {
            settings,
            git,
            registry_factory: Box::new(GeneratorRegistry::discover),
            cancel: CancelFlag::new(),
        }
    }

    /// Replace generator discovery, e.g. with a fixed set of generators.
    pub fn with_registry_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Settings) -> GeneratorRegistry + 'a,
    {
        self.registry_factory = Box::new(factory);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the run.
    ///
    /// `Err` means the run itself failed: invalid settings, lock held elsewhere, sync failure,
    /// branch listing failure or cancellation. Branch failures are reported
    /// inside the returned `RunReport`.
    pub fn run(&self) -> Result<RunReport> {
        self.settings.validate()?;
        let clone_path = self.settings.clone_path();
        let _lock = RunLock::acquire(&clone_path)?;

        let mut handle = RepositoryHandle::from_settings(self.settings);
        let result = self.run_in(&handle);
        handle.cleanup();

        match &result {
            Ok(report) => info!(
                "Run finished: {} branch(es), {} failed",
                report.branches.len(),
                report.failures().count()
            ),
            Err(e) => error!("Run failed: {}", e),
        }
        result
    }

    fn run_in(&self, handle: &RepositoryHandle) -> Result<RunReport> {
        let mut state = RunState::Init;
        info!("Syncing {} ({})", handle.url(), handle.branch());
        let repo = match self.git.sync(handle.url(), handle.branch(), handle.path()) {
            Ok(path) => path,
            Err(e) => {
                transition(state, RunState::Failed);
                return Err(e);
            }
        };
        state = transition(state, RunState::Synced);

        let pattern = BranchPattern::new(&self.settings.branch_pattern)?;
        let branches = self.git.list_remote_branches(&repo, &pattern)?;
        if branches.is_empty() {
            warn!("No remote branches match '{}'", pattern.as_str());
            return Ok(RunReport {
                branches: Vec::new(),
                final_state: transition(state, RunState::Done),
            });
        }
        info!(
            "Found {} branch(es) matching '{}': {}",
            branches.len(),
            pattern.as_str(),
            branches.join(", ")
        );

        let registry = (self.registry_factory)(self.settings);
        let mut outcomes = Vec::with_capacity(branches.len());

        for (index, branch) in branches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Cancellation requested, stopping before branch {}", branch);
                return Err(Error::Cancelled {
                    completed: index,
                    remaining: branches.len() - index,
                    failures: failure_messages(&outcomes),
                });
            }
            state = transition(state, RunState::Branch(index));

            info!("Processing branch {}", branch);
            let result = self.process_branch(&repo, branch, &registry);
            match &result {
                Ok(BranchStatus::Published { commit }) => {
                    info!("Branch {}: published configs generated from {}", branch, commit)
                }
                Ok(BranchStatus::Unchanged) => info!("Branch {}: no changes", branch),
                Err(e) => error!("Branch {} failed: {}", branch, e),
            }
            outcomes.push(BranchOutcome {
                branch: branch.clone(),
                result,
            });
        }

        Ok(RunReport {
            branches: outcomes,
            final_state: transition(state, RunState::Done),
        })
    }

    fn process_branch(
        &self,
        repo: &Path,
        branch: &str,
        registry: &GeneratorRegistry,
    ) -> Result<BranchStatus> {
        self.git.checkout_tracking(repo, branch)?;
        let commit = self.git.current_commit_id(repo)?;

        for generator in registry.generators() {
            generator
                .generate_config()
                .map_err(|e| Error::generator(generator.name(), e))?;
        }

        let message = commit_message(branch, &commit);
        match self.git.commit_and_push(repo, branch, &message)? {
            PublishOutcome::Pushed => Ok(BranchStatus::Published { commit }),
            PublishOutcome::NoChanges => Ok(BranchStatus::Unchanged),
        }
    }
}

impl fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("clone_path", &self.settings.clone_path())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

pub fn commit_message(branch: &str, commit: &str) -> String {
    format!("Auto-generated configs for branch {} (from {})", branch, commit)
}

fn transition(from: RunState, to: RunState) -> RunState {
    debug!("Run state {:?} -> {:?}", from, to);
    to
}
