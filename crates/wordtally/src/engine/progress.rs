use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::job::{Job, JobId, Progress};

/// Receives progress and status events from running jobs.
pub trait ProgressObserver: Send + Sync {
    /// Called after every completed file.
    fn on_progress(&self, job_id: JobId, progress: &Progress);

    /// Called whenever a job changes status.
    fn on_status(&self, _job: &Job) {}
}

/// No-op observer for unit tests.
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _job_id: JobId, _progress: &Progress) {}
}

/// Logs each progress event at debug level.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, job_id: JobId, progress: &Progress) {
        log::debug!(
            "Job {} is analyzing files. Progress: {}/{} ({}%)",
            job_id,
            progress.processed_files,
            progress.total_files,
            progress.percentage as u32
        );
    }

    fn on_status(&self, job: &Job) {
        log::info!("Job {} is now {}", job.id, job.status);
    }
}

/// Fans events out to several observers.
pub struct ObserverSet {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ObserverSet {
    pub fn new(observers: Vec<Arc<dyn ProgressObserver>>) -> Self {
        Self { observers }
    }
}

impl ProgressObserver for ObserverSet {
    fn on_progress(&self, job_id: JobId, progress: &Progress) {
        for observer in &self.observers {
            observer.on_progress(job_id, progress);
        }
    }

    fn on_status(&self, job: &Job) {
        for observer in &self.observers {
            observer.on_status(job);
        }
    }
}

/// Counts completed files for one job.
///
/// File tasks call [`ProgressTracker::file_completed`] concurrently. The
/// counter is atomic; the snapshot only ever moves forward, so a late
/// observer call can never roll it back.
pub struct ProgressTracker {
    job_id: JobId,
    total_files: usize,
    processed: AtomicUsize,
    snapshot: Mutex<Progress>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressTracker {
    pub fn new(job_id: JobId, total_files: usize, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            job_id,
            total_files,
            processed: AtomicUsize::new(0),
            snapshot: Mutex::new(Progress::new(total_files, 0)),
            observer,
        }
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn processed_files(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    /// Records one finished file and notifies the observer.
    pub fn file_completed(&self) -> Progress {
        let processed = self.processed.fetch_add(1, Ordering::AcqRel) + 1;
        let progress = Progress::new(self.total_files, processed);

        if let Ok(mut snapshot) = self.snapshot.lock() {
            if snapshot.processed_files < processed {
                *snapshot = progress;
            }
        }

        self.observer.on_progress(self.job_id, &progress);
        progress
    }

    /// Latest in-memory progress.
    pub fn snapshot(&self) -> Progress {
        self.snapshot
            .lock()
            .map(|s| *s)
            .unwrap_or_else(|_| Progress::new(self.total_files, self.processed_files()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingObserver {
        calls: AtomicUsize,
        last_percentage: Mutex<f32>,
    }

    impl ProgressObserver for CountingObserver {
        fn on_progress(&self, _job_id: JobId, progress: &Progress) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_percentage.lock().unwrap() = progress.percentage;
        }
    }

    #[test]
    fn test_tracker_counts_files() {
        let tracker = ProgressTracker::new(JobId::new(1), 4, Arc::new(NoopProgress));

        assert_eq!(tracker.file_completed().processed_files, 1);
        assert_eq!(tracker.file_completed().percentage, 50.0);
        assert_eq!(tracker.snapshot(), Progress::new(4, 2));
    }

    #[test]
    fn test_tracker_notifies_observer() {
        let observer = Arc::new(CountingObserver {
            calls: AtomicUsize::new(0),
            last_percentage: Mutex::new(0.0),
        });
        let tracker = ProgressTracker::new(JobId::new(1), 2, observer.clone());

        tracker.file_completed();
        tracker.file_completed();

        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*observer.last_percentage.lock().unwrap(), 100.0);
    }

    #[test]
    fn test_tracker_concurrent_increments() {
        let tracker = Arc::new(ProgressTracker::new(
            JobId::new(9),
            800,
            Arc::new(NoopProgress),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.file_completed();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.processed_files(), 800);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.processed_files, 800);
        assert_eq!(snapshot.percentage, 100.0);
    }

    #[test]
    fn test_observer_set_forwards() {
        let a = Arc::new(CountingObserver {
            calls: AtomicUsize::new(0),
            last_percentage: Mutex::new(0.0),
        });
        let b = Arc::new(CountingObserver {
            calls: AtomicUsize::new(0),
            last_percentage: Mutex::new(0.0),
        });
        let set = ObserverSet::new(vec![a.clone() as Arc<dyn ProgressObserver>, b.clone()]);

        set.on_progress(JobId::new(1), &Progress::new(1, 1));

        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }
}
