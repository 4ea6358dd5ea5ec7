pub mod broadcast;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod sanitize;
pub mod store;
pub mod worker;

pub use broadcast::{JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, Config};
pub use engine::{
    AnalysisResults, AnalysisSettings, Job, JobId, JobManager, JobStatus, JobStatusView,
    JobSummary, Progress,
};
pub use error::{AnalysisError, ConfigError, JobError, Result, StoreError, WordtallyError};
pub use store::{InMemoryProcessStore, ProcessStore, SqliteProcessStore};
