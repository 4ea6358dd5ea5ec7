//! The job engine: lifecycle, cancellation, progress and aggregation.

pub mod aggregator;
pub mod cancellation;
pub mod job;
pub mod manager;
pub mod progress;
pub mod settings;
mod supervisor;
pub mod view;

pub use aggregator::{aggregate, TOP_WORDS};
pub use cancellation::{CancellationController, CancellationToken, Checkpoint};
pub use job::{AnalysisResults, Job, JobId, JobStatus, Progress};
pub use manager::JobManager;
pub use progress::{LogProgress, NoopProgress, ObserverSet, ProgressObserver, ProgressTracker};
pub use settings::AnalysisSettings;
pub use view::{JobStatusView, JobSummary};
