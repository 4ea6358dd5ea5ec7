//! Versioned job schema, tracked in `PRAGMA user_version`.

use rusqlite::Connection;

use super::error::DatabaseError;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Upgrade steps, oldest first. Step `n` moves the file to version `n`.
const STEPS: &[(u32, &str)] = &[(1, include_str!("sql/001_create_jobs.sql"))];

pub fn current_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings the job schema up to [`SCHEMA_VERSION`].
///
/// Each step and its version bump commit together. A file from a newer
/// build is refused rather than written with an older layout.
pub fn upgrade(conn: &Connection) -> Result<(), DatabaseError> {
    let found = current_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(DatabaseError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    for &(version, sql) in STEPS.iter().filter(|(version, _)| *version > found) {
        let step_failed = |e: rusqlite::Error| DatabaseError::Migration {
            version,
            message: e.to_string(),
        };

        let tx = conn.unchecked_transaction().map_err(step_failed)?;
        tx.execute_batch(sql).map_err(step_failed)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(step_failed)?;
        tx.commit().map_err(step_failed)?;

        log::info!("Job database upgraded to schema v{}", version);
    }

    Ok(())
}
