//! SQLite file holding job records.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod job_repo;
pub mod schema;

pub use error::DatabaseError;

/// Connection settings for the job file. WAL lets `wordtally list` read while
/// a `run` in another process is writing.
const PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA busy_timeout = 5000;
";

/// Handle to the job database.
///
/// A job is written three times over its life, so a single connection
/// behind a mutex is enough. Clones share the connection.
#[derive(Clone)]
pub struct JobDatabase {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl JobDatabase {
    /// Opens or creates the job file at `path` and upgrades its schema.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(PRAGMAS)?;
        schema::upgrade(&conn)?;

        log::info!(
            "Job database ready at {} (schema v{})",
            path.display(),
            schema::SCHEMA_VERSION
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Job records that live only as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        schema::upgrade(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Backing file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<u32, DatabaseError> {
        self.with_conn(schema::current_version)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.wordtally/data/wordtally.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".wordtally").join("data").join("wordtally.db"))
}
