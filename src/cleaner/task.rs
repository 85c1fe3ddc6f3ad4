//! Cleanup Task Module
//!
//! One configured folder: a single scan pass, the per-file deletion rule and
//! the task's health record.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cleaner::health::{HealthRecord, HealthReporter};
use crate::cleaner::metrics::{MetricsSink, TaskLabels};
use crate::cleaner::pattern::PatternMatcher;
use crate::config::TaskConfig;
use crate::error::{CleanerError, ScanError, ScheduleError};
use crate::tasks::spawn_cleanup_loop;

// == Scan Stats ==
/// Counts gathered during one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Entries below the root that were looked at
    pub examined: usize,
    /// Files deleted
    pub removed: usize,
    /// Subfolders not descended because the task is not recursive
    pub skipped_dirs: usize,
}

/// Deletion rule for a regular file.
///
/// `age` is `None` when the modification time lies in the future.
pub fn is_deletion_candidate(
    age: Option<Duration>,
    ttl: Duration,
    file_name: &OsStr,
    pattern: Option<&PatternMatcher>,
) -> bool {
    let expired = age.is_some_and(|age| age > ttl);
    expired && pattern.map_or(true, |p| p.is_match(file_name))
}

// == Cleanup Task ==
/// A configured folder together with its health and counters.
pub struct CleanupTask {
    config: TaskConfig,
    pattern: Option<PatternMatcher>,
    labels: TaskLabels,
    sink: Arc<dyn MetricsSink>,
    health: watch::Sender<HealthRecord>,
    scheduled: AtomicBool,
}

impl fmt::Debug for CleanupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupTask")
            .field("config", &self.config)
            .field("labels", &self.labels)
            .field("health", &*self.health.borrow())
            .finish_non_exhaustive()
    }
}

impl CleanupTask {
    // == Constructor ==
    /// Builds a task, compiling its pattern.
    ///
    /// The task starts unhealthy with "Not yet started".
    pub fn new(config: TaskConfig, sink: Arc<dyn MetricsSink>) -> Result<Self, CleanerError> {
        let pattern = config.pattern_source().map(PatternMatcher::new).transpose()?;
        let labels = TaskLabels::new(
            config.path.to_string_lossy(),
            pattern.as_ref().map(PatternMatcher::as_str).unwrap_or_default(),
        );
        sink.register(&labels);
        let (health, _) = watch::channel(HealthRecord::not_started());

        Ok(Self {
            config,
            pattern,
            labels,
            sink,
            health,
            scheduled: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn labels(&self) -> &TaskLabels {
        &self.labels
    }

    /// Snapshot of the current health record.
    pub fn health(&self) -> HealthRecord {
        self.health.borrow().clone()
    }

    /// Receiver that observes every health transition.
    pub fn subscribe_health(&self) -> watch::Receiver<HealthRecord> {
        self.health.subscribe()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }

    // == Schedule ==
    /// Starts the recurring scan loop and returns without waiting for a scan.
    ///
    /// The loop runs on `tracker` until `shutdown` fires.
    pub fn schedule(
        self: &Arc<Self>,
        shutdown: &CancellationToken,
        tracker: &TaskTracker,
    ) -> Result<(), ScheduleError> {
        info!(path = %self.config.path.display(), "Scheduling the folder cleaner");
        spawn_cleanup_loop(Arc::clone(self), shutdown.clone(), tracker)
    }

    /// Claims the single loop slot; false when already scheduled.
    pub(crate) fn mark_scheduled(&self) -> bool {
        self.scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn set_health(&self, is_healthy: bool, description: &str) {
        self.health
            .send_replace(HealthRecord::new(is_healthy, description));
    }

    pub(crate) fn record_scan_failure(&self) {
        self.sink.increment_scan_failure(&self.labels);
    }

    // == Scan ==
    /// Walks the folder once, in file name order, and removes every expired,
    /// matching regular file. Symlinks count when their target is one.
    ///
    /// The first failure aborts the pass. Blocking; run it off the async
    /// executor.
    pub fn scan(&self) -> Result<ScanStats, ScanError> {
        let root = &self.config.path;
        info!(path = %root.display(), "Cleaning");

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let now = SystemTime::now();
        let mut stats = ScanStats::default();

        for entry in WalkDir::new(root).max_depth(max_depth).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(root.as_path()).to_path_buf();
                let depth = err.depth();
                let source = io::Error::from(err);
                if depth == 0 {
                    ScanError::DirectoryRead { path, source }
                } else {
                    ScanError::Investigation { path, source }
                }
            })?;

            if entry.depth() == 0 {
                if !entry.file_type().is_dir() {
                    return Err(ScanError::DirectoryRead {
                        path: root.clone(),
                        source: io::Error::new(io::ErrorKind::Other, "not a directory"),
                    });
                }
                continue;
            }

            stats.examined += 1;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                if !self.config.recursive {
                    debug!(folder = %entry.path().display(), "Skip folder as the recursive flag isn't set");
                    stats.skipped_dirs += 1;
                }
                continue;
            }
            // a link is judged by its target; removing it removes the link only
            let metadata = if file_type.is_symlink() {
                fs::metadata(entry.path())
            } else if file_type.is_file() {
                entry.metadata().map_err(io::Error::from)
            } else {
                continue;
            };
            let metadata = metadata.map_err(|source| ScanError::Investigation {
                path: entry.path().to_path_buf(),
                source,
            })?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(|source| ScanError::Investigation {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let age = now.duration_since(modified).ok();

            if !is_deletion_candidate(age, self.config.ttl, entry.file_name(), self.pattern.as_ref()) {
                continue;
            }

            info!(
                file = %entry.path().display(),
                modified = %DateTime::<Utc>::from(modified),
                "Deleting file as ttl was reached"
            );
            if let Err(source) = fs::remove_file(entry.path()) {
                self.sink.increment_remove_failure(&self.labels);
                return Err(ScanError::Deletion {
                    path: entry.path().to_path_buf(),
                    source,
                });
            }
            self.sink.increment_removed(&self.labels);
            stats.removed += 1;
        }

        Ok(stats)
    }
}

impl HealthReporter for CleanupTask {
    fn is_alive(&self) -> (bool, String) {
        self.health.borrow().as_pair()
    }
}
