use std::path::PathBuf;
use thiserror::Error;

use crate::engine::job::{JobId, JobStatus};

#[derive(Error, Debug)]
pub enum WordtallyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid file extension '{extension}': {reason}")]
    InvalidExtension { extension: String, reason: String },
}

/// Failures raised while scanning or analyzing a folder.
///
/// `Cancelled` is an outcome rather than a fault: the supervisor converts it
/// into the `Stopped` terminal state and never reports it to callers.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid folder path: {0}")]
    InvalidPath(PathBuf),

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {id} finished as {status} before it could be stopped")]
    NotStopped { id: JobId, status: JobStatus },

    #[error("Job store failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to encode job {id}: {source}")]
    Encode {
        id: JobId,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt job record {id}: {reason}")]
    Corrupt { id: JobId, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, WordtallyError>;
