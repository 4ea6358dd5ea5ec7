//! Durable storage for job records.
//!
//! The engine only talks to [`ProcessStore`]. Two implementations ship with
//! the crate: an in-memory map for tests and embedding, and a SQLite-backed
//! store for the command-line front end.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryProcessStore;
pub use sqlite::SqliteProcessStore;

use crate::engine::job::{Job, JobId};
use crate::error::StoreError;

/// Persistence interface consumed by the job manager.
pub trait ProcessStore: Send + Sync {
    /// Inserts or replaces the record and returns what was stored.
    fn save(&self, job: &Job) -> Result<Job, StoreError>;

    fn find(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    fn exists(&self, id: JobId) -> Result<bool, StoreError>;

    /// Every stored job, ordered by id.
    fn find_all(&self) -> Result<Vec<Job>, StoreError>;
}
