//! Broadcasting of job events to live subscribers.

pub mod job_progress;

pub use job_progress::{JobEventKind, JobProgressBroadcaster, JobProgressEvent};
