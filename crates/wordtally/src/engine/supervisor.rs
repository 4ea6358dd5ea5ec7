//! The per-job task that drives scan, fan-out, aggregation and finalization.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::engine::aggregator::aggregate;
use crate::engine::cancellation::{CancellationToken, Checkpoint, TerminalSender};
use crate::engine::job::{AnalysisResults, Job, Progress};
use crate::engine::manager::EngineInner;
use crate::engine::progress::ProgressTracker;
use crate::error::AnalysisError;
use crate::sanitize;
use crate::worker::analyzer::FileAnalysisResult;
use crate::worker::scanner::FolderScanner;

type Outcome = Result<(AnalysisResults, Progress), AnalysisError>;

/// Runs one job to its terminal state.
pub(crate) async fn supervise(
    inner: Arc<EngineInner>,
    mut job: Job,
    root: PathBuf,
    token: CancellationToken,
    terminal_tx: TerminalSender,
) {
    let span = tracing::info_span!("job", job_id = job.id.get());

    async move {
        let outcome = run(&inner, &mut job, root, &token).await;
        finalize(&inner, job, outcome, terminal_tx);
    }
    .instrument(span)
    .await
}

async fn run(
    inner: &EngineInner,
    job: &mut Job,
    root: PathBuf,
    token: &CancellationToken,
) -> Outcome {
    token.checkpoint()?;

    let scanner = FolderScanner::new(root, &inner.settings.file_extensions);
    let files = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .map_err(|e| AnalysisError::Internal(format!("scan task failed: {}", e)))??;

    token.checkpoint()?;

    if files.is_empty() {
        log::info!("Job {} found no eligible files", job.id);
        job.estimated_completion = Some(job.started_at);
        return Ok((AnalysisResults::default(), Progress::new(0, 0)));
    }

    if !job.start_running(files.len(), inner.settings.estimate_per_file) {
        return Err(AnalysisError::Internal(format!(
            "job {} cannot start from {}",
            job.id, job.status
        )));
    }
    inner.store.save(job).map_err(|e| {
        AnalysisError::Internal(format!("failed to persist running state: {}", e))
    })?;
    inner.observer.on_status(job);
    log::info!("Job {} is analyzing {} files", job.id, files.len());

    let tracker = Arc::new(ProgressTracker::new(
        job.id,
        files.len(),
        Arc::clone(&inner.observer),
    ));
    inner.track(job.id, Arc::clone(&tracker));

    let results = analyze_files(inner, files, &tracker, token).await;
    job.progress = Some(tracker.snapshot());
    let results = results?;

    // Last checkpoint before the result is committed.
    token.checkpoint()?;

    Ok((aggregate(&results), tracker.snapshot()))
}

async fn analyze_files(
    inner: &EngineInner,
    files: Vec<PathBuf>,
    tracker: &Arc<ProgressTracker>,
    token: &CancellationToken,
) -> Result<Vec<FileAnalysisResult>, AnalysisError> {
    let limiter = inner
        .settings
        .max_concurrent_files
        .filter(|&limit| limit > 0)
        .map(|limit| Arc::new(Semaphore::new(limit)));
    let delay = inner.settings.file_delay;

    let mut tasks = JoinSet::new();
    for path in files {
        let analyzer = inner.analyzer.clone();
        let tracker = Arc::clone(tracker);
        let token = token.child_token();
        let limiter = limiter.clone();
        let span = tracing::debug_span!("file", file = %sanitize::redact_path(&path));

        tasks.spawn(
            async move {
                let _permit = match limiter {
                    Some(semaphore) => Some(
                        semaphore
                            .acquire_owned()
                            .await
                            .map_err(|e| AnalysisError::Internal(e.to_string()))?,
                    ),
                    None => None,
                };

                let result = analyzer.analyze(&path, &token).await?;
                tracker.file_completed();
                throttle(delay, &token).await;
                Ok::<_, AnalysisError>(result)
            }
            .instrument(span),
        );
    }

    let mut results = Vec::with_capacity(tracker.total_files());
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tasks.abort_all();
                return Err(AnalysisError::Cancelled);
            }
            next = tasks.join_next() => match next {
                None => break,
                Some(Ok(Ok(result))) => results.push(result),
                Some(Ok(Err(e))) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Some(Err(e)) => {
                    tasks.abort_all();
                    return Err(AnalysisError::Internal(format!("file task failed: {}", e)));
                }
            }
        }
    }

    Ok(results)
}

/// Sleeps for `delay` unless the job is cancelled first.
async fn throttle(delay: Duration, token: &CancellationToken) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = token.cancelled() => {}
    }
}

/// Writes the terminal state exactly once and releases the job.
///
/// The store write runs inside `finish_with`, so the registry lock is held
/// across one blocking save. Cancel requests for other jobs wait for it.
fn finalize(inner: &EngineInner, mut job: Job, outcome: Outcome, terminal_tx: TerminalSender) {
    let id = job.id;

    let job = inner.controller.finish_with(id, |cancelled| {
        match outcome {
            _ if cancelled => {
                job.stop();
            }
            Err(AnalysisError::Cancelled) => {
                job.stop();
            }
            Ok((results, progress)) => {
                job.complete(results, progress);
            }
            Err(e) => {
                log::error!("Job {} failed: {}", id, e);
                job.fail(e.to_string());
            }
        }

        if let Err(e) = inner.store.save(&job) {
            log::error!("Failed to persist terminal state of job {}: {}", id, e);
        }
        inner.untrack(id);
        job
    });

    inner.observer.on_status(&job);
    terminal_tx.send_replace(Some(job));
}
