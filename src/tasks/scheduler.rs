//! Folder Cleanup Loop
//!
//! Drives one [`CleanupTask`]: scan now, then once per interval, until the
//! shared cancellation token fires. Scan outcomes become health transitions.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::cleaner::health::{CLEAN_FAILED, FOLDER_CLEANED};
use crate::cleaner::{CleanupTask, ScanStats};
use crate::error::{ScanError, ScheduleError};

type ScanHandle = JoinHandle<Result<ScanStats, ScanError>>;

/// Spawns the recurring cleanup loop for `task` on `tracker`.
///
/// Returns as soon as the loop is spawned. Only setup problems are reported
/// here; scan failures show up in the task's health and counters.
///
/// # Example
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let tracker = TaskTracker::new();
/// spawn_cleanup_loop(task, shutdown.clone(), &tracker)?;
/// // Later, during shutdown:
/// shutdown.cancel();
/// tracker.close();
/// tracker.wait().await;
/// ```
pub fn spawn_cleanup_loop(
    task: Arc<CleanupTask>,
    shutdown: CancellationToken,
    tracker: &TaskTracker,
) -> Result<(), ScheduleError> {
    let path = task.path().to_path_buf();
    let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime(path.clone()))?;
    if shutdown.is_cancelled() {
        return Err(ScheduleError::ShutdownRequested(path));
    }
    let period = task.config().effective_interval();
    if period.is_zero() {
        return Err(ScheduleError::ZeroInterval(path));
    }
    if !task.mark_scheduled() {
        return Err(ScheduleError::AlreadyScheduled(path));
    }

    tracker.spawn_on(run_cleanup_loop(task, period, shutdown), &runtime);
    Ok(())
}

async fn run_cleanup_loop(task: Arc<CleanupTask>, period: Duration, shutdown: CancellationToken) {
    let path = task.path().display().to_string();
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;
    let mut in_flight: Option<ScanHandle> = None;

    info!(path = %path, interval = ?period, "Cleaner started");

    loop {
        match scan_once(&task, &mut in_flight).await {
            Ok(stats) => {
                debug!(
                    path = %path,
                    examined = stats.examined,
                    removed = stats.removed,
                    skipped_dirs = stats.skipped_dirs,
                    "Folder cleaned"
                );
                task.set_health(true, FOLDER_CLEANED);
            }
            Err(ScanError::Stalled(_)) => {
                // already counted when the parked scan timed out
                warn!(path = %path, "Previous scan still running, skipping this tick");
                task.set_health(false, CLEAN_FAILED);
            }
            Err(err) => {
                error!(path = %path, kind = err.kind(), error = %err, "While cleaning folder");
                task.record_scan_failure();
                task.set_health(false, CLEAN_FAILED);
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(path = %path, "Cleaner stopped");
                return;
            }
            _ = ticker.tick() => {}
        }
    }
}

/// Runs one scan of `task` on the blocking pool, honouring its deadline.
async fn scan_once(
    task: &Arc<CleanupTask>,
    in_flight: &mut Option<ScanHandle>,
) -> Result<ScanStats, ScanError> {
    let worker = Arc::clone(task);
    run_with_deadline(task.path(), task.config().scan_timeout, in_flight, move || worker.scan()).await
}

/// Runs `scan` on the blocking pool.
///
/// A scan that overruns `deadline` is parked in `in_flight`; no new scan
/// starts until it has returned, and its late result is logged then.
async fn run_with_deadline<F>(
    path: &Path,
    deadline: Option<Duration>,
    in_flight: &mut Option<ScanHandle>,
    scan: F,
) -> Result<ScanStats, ScanError>
where
    F: FnOnce() -> Result<ScanStats, ScanError> + Send + 'static,
{
    if let Some(previous) = in_flight.take() {
        if !previous.is_finished() {
            *in_flight = Some(previous);
            return Err(ScanError::Stalled(path.to_path_buf()));
        }
        match previous.await {
            Ok(Ok(stats)) => info!(
                path = %path.display(),
                removed = stats.removed,
                "Overdue scan finished"
            ),
            Ok(Err(err)) => error!(
                path = %path.display(),
                kind = err.kind(),
                error = %err,
                "Overdue scan failed"
            ),
            Err(err) => error!(path = %path.display(), error = %err, "Overdue scan aborted"),
        }
    }

    let mut handle = tokio::task::spawn_blocking(scan);

    let joined = match deadline {
        Some(deadline) => match time::timeout(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                *in_flight = Some(handle);
                return Err(ScanError::Timeout {
                    path: path.to_path_buf(),
                    after: deadline,
                });
            }
        },
        None => handle.await,
    };

    joined.unwrap_or_else(|err| {
        Err(ScanError::Aborted {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    })
}
