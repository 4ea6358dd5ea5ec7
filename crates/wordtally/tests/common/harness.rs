//! Test harness for isolated job execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_fs::prelude::*;
use assert_fs::TempDir;

use wordtally::engine::{Job, JobId, Progress, ProgressObserver};
use wordtally::{AnalysisSettings, InMemoryProcessStore, JobManager, ProcessStore};

/// Upper bound for any single job in tests.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(10);

/// Records every progress and status event.
#[derive(Default)]
pub struct CollectingObserver {
    progress: Mutex<Vec<(JobId, Progress)>>,
    statuses: Mutex<Vec<Job>>,
}

impl CollectingObserver {
    pub fn progress(&self) -> Vec<(JobId, Progress)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<Job> {
        self.statuses.lock().unwrap().clone()
    }
}

impl ProgressObserver for CollectingObserver {
    fn on_progress(&self, job_id: JobId, progress: &Progress) {
        self.progress.lock().unwrap().push((job_id, *progress));
    }

    fn on_status(&self, job: &Job) {
        self.statuses.lock().unwrap().push(job.clone());
    }
}

/// A temporary text folder with a manager backed by an in-memory store.
pub struct TestHarness {
    temp_dir: TempDir,
    pub store: Arc<InMemoryProcessStore>,
    pub observer: Arc<CollectingObserver>,
    pub manager: JobManager,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(AnalysisSettings::default())
    }

    pub fn with_settings(settings: AnalysisSettings) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(InMemoryProcessStore::new());
        let observer = Arc::new(CollectingObserver::default());
        let manager = JobManager::with_observer(
            store.clone() as Arc<dyn ProcessStore>,
            settings,
            observer.clone() as Arc<dyn ProgressObserver>,
        )
        .expect("Failed to create job manager");

        Self {
            temp_dir,
            store,
            observer,
            manager,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `content` to `relative` under the root, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let child = self.temp_dir.child(relative);
        child.write_str(content).expect("Failed to write fixture");
        child.path().to_path_buf()
    }

    pub fn write_bytes(&self, relative: &str, content: &[u8]) -> PathBuf {
        let child = self.temp_dir.child(relative);
        child.write_binary(content).expect("Failed to write fixture");
        child.path().to_path_buf()
    }

    /// Submits the harness root and waits for the terminal record.
    pub async fn run(&self) -> Job {
        let job = self.manager.submit(self.root()).expect("submit failed");
        self.wait(job.id).await
    }

    pub async fn wait(&self, id: JobId) -> Job {
        tokio::time::timeout(JOB_TIMEOUT, self.manager.wait(id))
            .await
            .expect("job did not finish in time")
            .expect("wait failed")
    }
}
