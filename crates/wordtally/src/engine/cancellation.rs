//! Cooperative cancellation and the active-job registry.
//!
//! Every active job owns one [`CancellationToken`]; each file task gets a
//! child of it. The supervisor and the file tasks poll their token at fixed
//! checkpoints and nothing is interrupted preemptively.
//!
//! The [`CancellationController`] maps job ids to their token and to a watch
//! channel on which the supervisor publishes the terminal record, so that
//! `cancel` can wait for it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
pub use tokio_util::sync::CancellationToken;

use crate::engine::job::{Job, JobId};
use crate::error::AnalysisError;

/// Checkpoint polling on a [`CancellationToken`].
pub trait Checkpoint {
    /// Returns `Err(Cancelled)` once the token is cancelled.
    fn checkpoint(&self) -> Result<(), AnalysisError>;
}

impl Checkpoint for CancellationToken {
    fn checkpoint(&self) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Receiver side of a job's terminal-state channel.
pub type TerminalReceiver = watch::Receiver<Option<Job>>;

/// Sender side, owned by the job's supervisor.
pub type TerminalSender = watch::Sender<Option<Job>>;

struct ActiveJob {
    token: CancellationToken,
    terminal: TerminalReceiver,
}

/// Registry of active (non-terminal) jobs.
///
/// Raising a signal and deregistering both happen under the same lock. A
/// cancel request that finds the job therefore always sets the signal before
/// the supervisor takes its final decision.
#[derive(Default)]
pub struct CancellationController {
    active: Mutex<HashMap<JobId, ActiveJob>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, ActiveJob>> {
        self.active.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::warn!("Active job registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Registers a new active job and returns its token and terminal sender.
    pub fn register(&self, id: JobId) -> (CancellationToken, TerminalSender) {
        let token = CancellationToken::new();
        let (terminal_tx, terminal_rx) = watch::channel(None);
        let previous = self.lock().insert(
            id,
            ActiveJob {
                token: token.clone(),
                terminal: terminal_rx,
            },
        );
        if previous.is_some() {
            log::error!("Job {} was registered twice", id);
        }
        (token, terminal_tx)
    }

    /// Raises the signal of an active job.
    ///
    /// Returns a receiver for the job's terminal record, or `None` when the
    /// id is unknown or already finished.
    pub fn request_cancel(&self, id: JobId) -> Option<TerminalReceiver> {
        let active = self.lock();
        let job = active.get(&id)?;
        job.token.cancel();
        Some(job.terminal.clone())
    }

    /// Returns false for unknown or finished ids.
    pub fn is_cancelled(&self, id: JobId) -> bool {
        self.lock()
            .get(&id)
            .map(|job| job.token.is_cancelled())
            .unwrap_or(false)
    }

    pub fn is_active(&self, id: JobId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn active_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Subscribes to the terminal record of an active job without
    /// cancelling it.
    pub fn subscribe(&self, id: JobId) -> Option<TerminalReceiver> {
        self.lock().get(&id).map(|job| job.terminal.clone())
    }

    /// Runs `commit` and removes the job from the registry, all under the
    /// registry lock.
    ///
    /// `commit` receives whether cancellation had been requested. This is the
    /// final checkpoint before a result is committed: no cancel request can
    /// slip in between the decision and the removal, and once the job is no
    /// longer listed as active its terminal record has been written.
    ///
    /// `commit` must not call back into the controller. It may block on a
    /// store write, which delays other cancel requests until it returns.
    pub fn finish_with<R>(&self, id: JobId, commit: impl FnOnce(bool) -> R) -> R {
        let mut active = self.lock();
        let cancelled = active
            .get(&id)
            .map(|job| job.token.is_cancelled())
            .unwrap_or(false);
        let outcome = commit(cancelled);
        active.remove(&id);
        outcome
    }
}
