//! Job repository: CRUD operations for the `jobs` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{DatabaseError, JobDatabase};

/// A raw job row from the database.
///
/// `progress` and `results` hold JSON text; timestamps are RFC 3339.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: i64,
    pub status: String,
    pub root_path: String,
    pub started_at: String,
    pub estimated_completion: Option<String>,
    pub progress: Option<String>,
    pub results: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            status: row.get("status")?,
            root_path: row.get("root_path")?,
            started_at: row.get("started_at")?,
            estimated_completion: row.get("estimated_completion")?,
            progress: row.get("progress")?,
            results: row.get("results")?,
            completed_at: row.get("completed_at")?,
            error: row.get("error")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a job row, or overwrites every column of an existing one.
pub fn upsert(db: &JobDatabase, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, status, root_path, started_at, estimated_completion,
             progress, results, completed_at, error, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
             status=excluded.status, root_path=excluded.root_path,
             started_at=excluded.started_at,
             estimated_completion=excluded.estimated_completion,
             progress=excluded.progress, results=excluded.results,
             completed_at=excluded.completed_at, error=excluded.error,
             updated_at=excluded.updated_at",
            params![
                job.id,
                job.status,
                job.root_path,
                job.started_at,
                job.estimated_completion,
                job.progress,
                job.results,
                job.completed_at,
                job.error,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &JobDatabase, id: i64) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM jobs WHERE id = ?1",
                params![id],
                JobRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Returns true if a job with this ID exists.
pub fn exists(db: &JobDatabase, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?1)",
            params![id],
            |r| r.get(0),
        )?;
        Ok(found)
    })
}

/// Lists every job, oldest id first.
pub fn list_all(db: &JobDatabase) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &JobDatabase, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count.max(0) as u64)
    })
}
