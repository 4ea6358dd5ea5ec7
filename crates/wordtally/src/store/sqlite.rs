//! Process store backed by SQLite.

use chrono::{DateTime, Utc};

use crate::db::job_repo::{self, JobRow};
use crate::db::JobDatabase;
use crate::engine::job::{Job, JobId, JobStatus};
use crate::error::StoreError;

use super::ProcessStore;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_timestamp(s: &str, id: JobId) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("bad timestamp '{}': {}", s, e),
        })
}

fn row_id(id: JobId) -> Result<i64, StoreError> {
    i64::try_from(id.get()).map_err(|_| StoreError::Corrupt {
        id,
        reason: "id exceeds the SQLite integer range".to_string(),
    })
}

fn encode_json<T: serde::Serialize>(value: &Option<T>, id: JobId) -> Result<Option<String>, StoreError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|source| StoreError::Encode { id, source })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    text: &Option<String>,
    id: JobId,
) -> Result<Option<T>, StoreError> {
    text.as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("bad JSON column: {}", e),
        })
}

fn job_to_row(job: &Job) -> Result<JobRow, StoreError> {
    Ok(JobRow {
        id: row_id(job.id)?,
        status: job.status.as_str().to_string(),
        root_path: job.root_path.clone(),
        started_at: format_timestamp(job.started_at),
        estimated_completion: job.estimated_completion.map(format_timestamp),
        progress: encode_json(&job.progress, job.id)?,
        results: encode_json(&job.results, job.id)?,
        completed_at: job.completed_at.map(format_timestamp),
        error: job.error.clone(),
        updated_at: format_timestamp(Utc::now()),
    })
}

fn row_to_job(row: &JobRow) -> Result<Job, StoreError> {
    let id = JobId::new(u64::try_from(row.id).map_err(|_| StoreError::Corrupt {
        id: JobId::new(0),
        reason: format!("negative id {}", row.id),
    })?);

    let status: JobStatus = row
        .status
        .parse()
        .map_err(|reason| StoreError::Corrupt { id, reason })?;

    Ok(Job {
        id,
        status,
        root_path: row.root_path.clone(),
        started_at: parse_timestamp(&row.started_at, id)?,
        estimated_completion: row
            .estimated_completion
            .as_deref()
            .map(|s| parse_timestamp(s, id))
            .transpose()?,
        progress: decode_json(&row.progress, id)?,
        results: decode_json(&row.results, id)?,
        completed_at: row
            .completed_at
            .as_deref()
            .map(|s| parse_timestamp(s, id))
            .transpose()?,
        error: row.error.clone(),
    })
}

// ─── SqliteProcessStore ─────────────────────────────────────────────────────

/// Persistent process store backed by rusqlite.
///
/// All database operations are synchronous and short; callers on the async
/// runtime invoke them directly.
pub struct SqliteProcessStore {
    db: JobDatabase,
}

impl SqliteProcessStore {
    pub fn new(db: JobDatabase) -> Self {
        Self { db }
    }

    /// Number of stored jobs in `status`.
    pub fn count_by_status(&self, status: JobStatus) -> Result<u64, StoreError> {
        Ok(job_repo::count_by_status(&self.db, status.as_str())?)
    }
}

impl ProcessStore for SqliteProcessStore {
    fn save(&self, job: &Job) -> Result<Job, StoreError> {
        let row = job_to_row(job)?;
        job_repo::upsert(&self.db, &row)?;
        Ok(job.clone())
    }

    fn find(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        job_repo::find_by_id(&self.db, row_id(id)?)?
            .as_ref()
            .map(row_to_job)
            .transpose()
    }

    fn exists(&self, id: JobId) -> Result<bool, StoreError> {
        Ok(job_repo::exists(&self.db, row_id(id)?)?)
    }

    fn find_all(&self) -> Result<Vec<Job>, StoreError> {
        job_repo::list_all(&self.db)?
            .iter()
            .map(row_to_job)
            .collect()
    }
}
