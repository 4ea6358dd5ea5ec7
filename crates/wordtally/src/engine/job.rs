//! The job record and its state machine.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an analysis job. Always positive, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    /// Part of the state space; no transition currently leads here.
    Paused,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Paused => "Paused",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Stopped => "Stopped",
        }
    }

    /// Returns true for `Completed`, `Failed` and `Stopped`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// `Pending` may skip `Running` when the root is invalid (Failed), when the
    /// folder holds no eligible files (Completed), or when cancelled early.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => matches!(
                next,
                JobStatus::Running | JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped
            ),
            JobStatus::Running | JobStatus::Paused => next.is_terminal(),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(JobStatus::Pending),
            "Running" => Ok(JobStatus::Running),
            "Paused" => Ok(JobStatus::Paused),
            "Completed" => Ok(JobStatus::Completed),
            "Failed" => Ok(JobStatus::Failed),
            "Stopped" => Ok(JobStatus::Stopped),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// File-level progress of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total_files: usize,
    pub processed_files: usize,
    /// Always within `0.0..=100.0`.
    pub percentage: f32,
}

impl Progress {
    pub fn new(total_files: usize, processed_files: usize) -> Self {
        let percentage = if total_files == 0 {
            100.0
        } else {
            (processed_files.min(total_files) as f32 / total_files as f32) * 100.0
        };
        Self {
            total_files,
            processed_files,
            percentage,
        }
    }

    pub fn is_done(&self) -> bool {
        self.processed_files >= self.total_files
    }
}

/// Job-level summary produced by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResults {
    pub total_words: u64,
    pub total_lines: u64,
    /// At most ten words, by non-increasing count.
    pub most_frequent_words: Vec<String>,
    pub files_processed: Vec<String>,
}

/// A folder-analysis request and its evolving record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub root_path: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<AnalysisResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Creates a pending job stamped with the current time.
    pub fn new(id: JobId, root_path: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            root_path: root_path.into(),
            started_at: Utc::now(),
            estimated_completion: None,
            progress: None,
            results: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the job to `Running` once the file count is known.
    pub fn start_running(&mut self, total_files: usize, estimate_per_file: Duration) -> bool {
        if !self.transition(JobStatus::Running) {
            return false;
        }
        self.estimated_completion = Some(estimate_completion(
            self.started_at,
            total_files,
            estimate_per_file,
        ));
        self.progress = Some(Progress::new(total_files, 0));
        true
    }

    /// Attaches results and moves the job to `Completed`.
    pub fn complete(&mut self, results: AnalysisResults, progress: Progress) -> bool {
        if !self.transition(JobStatus::Completed) {
            return false;
        }
        self.progress = Some(progress);
        self.results = Some(results);
        true
    }

    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if !self.transition(JobStatus::Failed) {
            return false;
        }
        self.error = Some(error.into());
        true
    }

    /// Moves the job to `Stopped`. A stopped job never reports every file
    /// as processed, so a full snapshot is held one file short.
    pub fn stop(&mut self) -> bool {
        if !self.transition(JobStatus::Stopped) {
            return false;
        }
        if let Some(progress) = self.progress.filter(|p| p.total_files > 0 && p.is_done()) {
            self.progress = Some(Progress::new(
                progress.total_files,
                progress.total_files - 1,
            ));
        }
        true
    }

    fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            log::warn!(
                "Rejected transition of job {} from {} to {}",
                self.id,
                self.status,
                next
            );
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }
}

/// `started_at + estimate_per_file × total_files`, saturating on overflow.
pub fn estimate_completion(
    started_at: DateTime<Utc>,
    total_files: usize,
    estimate_per_file: Duration,
) -> DateTime<Utc> {
    let total = estimate_per_file.saturating_mul(u32::try_from(total_files).unwrap_or(u32::MAX));
    chrono::Duration::from_std(total)
        .ok()
        .and_then(|d| started_at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
