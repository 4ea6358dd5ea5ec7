//! Job progress broadcaster for live status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::engine::job::{Job, JobId, JobStatus, Progress};
use crate::engine::progress::ProgressObserver;

/// What an event reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobEventKind {
    /// The job changed status.
    Status,
    /// One more file finished.
    Progress,
}

/// Event published to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: JobId,
    pub kind: JobEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl JobProgressEvent {
    pub fn status(job: &Job) -> Self {
        Self {
            job_id: job.id,
            kind: JobEventKind::Status,
            status: Some(job.status),
            progress: job.progress,
            error: job.error.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn progress(job_id: JobId, progress: Progress) -> Self {
        Self {
            job_id,
            kind: JobEventKind::Progress,
            status: None,
            progress: Some(progress),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// True for status events carrying a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.map(|s| s.is_terminal()).unwrap_or(false)
    }
}

/// Broadcasts job events to any number of subscribers.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: JobProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressObserver for JobProgressBroadcaster {
    fn on_progress(&self, job_id: JobId, progress: &Progress) {
        self.send(JobProgressEvent::progress(job_id, *progress));
    }

    fn on_status(&self, job: &Job) {
        self.send(JobProgressEvent::status(job));
    }
}
