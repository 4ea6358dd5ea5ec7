//! Public entry point of the engine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::engine::cancellation::CancellationController;
use crate::engine::job::{Job, JobId, JobStatus};
use crate::engine::progress::{NoopProgress, ProgressObserver, ProgressTracker};
use crate::engine::settings::AnalysisSettings;
use crate::engine::supervisor;
use crate::engine::view::{JobStatusView, JobSummary};
use crate::error::JobError;
use crate::store::ProcessStore;
use crate::worker::analyzer::FileAnalyzer;

/// State shared by the manager and every supervisor task.
pub(crate) struct EngineInner {
    pub(crate) store: Arc<dyn ProcessStore>,
    pub(crate) controller: CancellationController,
    pub(crate) settings: AnalysisSettings,
    pub(crate) observer: Arc<dyn ProgressObserver>,
    pub(crate) analyzer: FileAnalyzer,
    next_id: AtomicU64,
    live: RwLock<HashMap<JobId, Arc<ProgressTracker>>>,
}

impl EngineInner {
    /// Makes in-memory progress of a running job visible to queries.
    pub(crate) fn track(&self, id: JobId, tracker: Arc<ProgressTracker>) {
        if let Ok(mut live) = self.live.write() {
            live.insert(id, tracker);
        }
    }

    pub(crate) fn untrack(&self, id: JobId) {
        if let Ok(mut live) = self.live.write() {
            live.remove(&id);
        }
    }

    /// Overlays live progress on a non-terminal record.
    fn with_live_progress(&self, mut job: Job) -> Job {
        if job.is_terminal() {
            return job;
        }
        if let Ok(live) = self.live.read() {
            if let Some(tracker) = live.get(&job.id) {
                job.progress = Some(tracker.snapshot());
            }
        }
        job
    }
}

/// Accepts analysis requests and answers queries about them.
///
/// Cloning is cheap; clones share the same store, registry and id sequence.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<EngineInner>,
}

impl JobManager {
    pub fn new(store: Arc<dyn ProcessStore>, settings: AnalysisSettings) -> Result<Self, JobError> {
        Self::with_observer(store, settings, Arc::new(NoopProgress))
    }

    /// Creates a manager whose jobs report to `observer`.
    ///
    /// Ids continue after the highest id already in `store`.
    pub fn with_observer(
        store: Arc<dyn ProcessStore>,
        settings: AnalysisSettings,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self, JobError> {
        let last_id = store
            .find_all()?
            .iter()
            .map(|job| job.id.get())
            .max()
            .unwrap_or(0);

        Ok(Self {
            inner: Arc::new(EngineInner {
                store,
                controller: CancellationController::new(),
                settings,
                observer,
                analyzer: FileAnalyzer::new(),
                next_id: AtomicU64::new(last_id + 1),
                live: RwLock::new(HashMap::new()),
            }),
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.inner.settings
    }

    /// Creates a pending job for `root` and schedules its supervisor.
    ///
    /// Returns as soon as the pending record is stored; the analysis runs in
    /// the background.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn submit(&self, root: impl Into<PathBuf>) -> Result<Job, JobError> {
        let root = root.into();
        let id = JobId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let job = Job::new(id, root.to_string_lossy());

        let job = self.inner.store.save(&job)?;
        self.inner.observer.on_status(&job);
        log::info!("Submitted job {} for {}", id, root.display());

        let (token, terminal_tx) = self.inner.controller.register(id);
        tokio::spawn(supervisor::supervise(
            Arc::clone(&self.inner),
            job.clone(),
            root,
            token,
            terminal_tx,
        ));

        Ok(job)
    }

    /// Cancels an active job and waits until it has been stopped.
    ///
    /// Fails with `NotFound` for unknown ids and for jobs that already
    /// finished. If the job reaches another terminal state first, fails with
    /// `NotStopped`.
    pub async fn cancel(&self, id: JobId) -> Result<Job, JobError> {
        let mut terminal = self
            .inner
            .controller
            .request_cancel(id)
            .ok_or(JobError::NotFound(id))?;
        log::info!("Cancellation requested for job {}", id);

        let job = match terminal.wait_for(|job| job.is_some()).await {
            Ok(job) => job.clone(),
            Err(_) => None,
        };
        let job = match job {
            Some(job) => job,
            None => self.load(id)?,
        };

        match job.status {
            JobStatus::Stopped => Ok(job),
            status => Err(JobError::NotStopped { id, status }),
        }
    }

    /// Waits until `id` reaches a terminal state and returns the record.
    pub async fn wait(&self, id: JobId) -> Result<Job, JobError> {
        if let Some(mut terminal) = self.inner.controller.subscribe(id) {
            if let Ok(job) = terminal.wait_for(|job| job.is_some()).await {
                if let Some(job) = job.clone() {
                    return Ok(job);
                }
            }
        }
        self.load(id)
    }

    pub fn status(&self, id: JobId) -> Result<JobStatusView, JobError> {
        Ok(JobStatusView::from(&self.load(id)?))
    }

    /// Full record, including results once completed.
    pub fn results(&self, id: JobId) -> Result<Job, JobError> {
        Ok(self.inner.with_live_progress(self.load(id)?))
    }

    /// Every known job, ordered by id.
    pub fn list(&self) -> Result<Vec<JobSummary>, JobError> {
        Ok(self
            .inner
            .store
            .find_all()?
            .into_iter()
            .map(|job| self.inner.with_live_progress(job))
            .map(|job| JobSummary::from(&job))
            .collect())
    }

    /// Ids of jobs that have not reached a terminal state.
    pub fn active_jobs(&self) -> Vec<JobId> {
        self.inner.controller.active_ids()
    }

    pub fn is_cancelled(&self, id: JobId) -> bool {
        self.inner.controller.is_cancelled(id)
    }

    fn load(&self, id: JobId) -> Result<Job, JobError> {
        self.inner.store.find(id)?.ok_or(JobError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryProcessStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn manager(settings: AnalysisSettings) -> JobManager {
        JobManager::new(Arc::new(InMemoryProcessStore::new()), settings).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_submit_returns_pending_and_completes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.txt", "the cat sat");
        write(&dir, "nested/b.txt", "the dog sat");
        write(&dir, "skip.log", "ignored words here");

        let manager = manager(AnalysisSettings::default());
        let job = manager.submit(dir.path()).unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let done = manager.wait(job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);

        let progress = done.progress.unwrap();
        assert_eq!(progress.processed_files, 2);
        assert_eq!(progress.percentage, 100.0);

        let results = done.results.unwrap();
        assert_eq!(results.total_words, 6);
        assert_eq!(results.total_lines, 2);
        assert_eq!(results.most_frequent_words, vec!["the", "sat", "cat", "dog"]);
        assert!(manager.active_jobs().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let dir = TempDir::new().unwrap();
        let manager = manager(AnalysisSettings::default());

        let first = manager.submit(dir.path()).unwrap();
        let second = manager.submit(dir.path()).unwrap();
        assert_eq!(second.id.get(), first.id.get() + 1);
    }

    #[tokio::test]
    async fn test_ids_continue_after_stored_jobs() {
        let store = Arc::new(InMemoryProcessStore::new());
        store.save(&Job::new(JobId::new(41), "/old")).unwrap();

        let manager = JobManager::new(store, AnalysisSettings::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let job = manager.submit(dir.path()).unwrap();
        assert_eq!(job.id, JobId::new(42));
    }

    #[tokio::test]
    async fn test_invalid_path_fails_without_running() {
        let manager = manager(AnalysisSettings::default());
        let job = manager.submit("/definitely/not/a/folder").unwrap();

        let done = manager.wait(job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.error.unwrap().contains("Invalid folder path"));
        assert!(done.progress.is_none());
        assert!(done.results.is_none());
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write(&dir, &format!("f{}.txt", i), "some words in here");
        }
        let settings = AnalysisSettings {
            max_concurrent_files: Some(1),
            file_delay: Duration::from_secs(5),
            ..AnalysisSettings::default()
        };
        let manager = manager(settings);
        let job = manager.submit(dir.path()).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stopped = tokio::time::timeout(Duration::from_secs(2), manager.cancel(job.id))
            .await
            .expect("cancel did not return promptly")
            .unwrap();

        assert_eq!(stopped.status, JobStatus::Stopped);
        assert!(stopped.results.is_none());
        assert_eq!(manager.results(job.id).unwrap().status, JobStatus::Stopped);
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let manager = manager(AnalysisSettings::default());
        let err = manager.cancel(JobId::new(99)).await.unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_finished_job_is_not_found() {
        let dir = TempDir::new().unwrap();
        let manager = manager(AnalysisSettings::default());
        let job = manager.submit(dir.path()).unwrap();
        manager.wait(job.id).await.unwrap();

        let err = manager.cancel(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_and_list() {
        let dir = TempDir::new().unwrap();
        let manager = manager(AnalysisSettings::default());
        let job = manager.submit(dir.path()).unwrap();
        manager.wait(job.id).await.unwrap();

        let view = manager.status(job.id).unwrap();
        assert_eq!(view.status, JobStatus::Completed);

        let list = manager.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, job.id);
        assert!(matches!(
            manager.status(JobId::new(1234)),
            Err(JobError::NotFound(_))
        ));
    }
}
