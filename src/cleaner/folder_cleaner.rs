//! Folder Cleaner Module
//!
//! Owns every cleanup task, schedules them and aggregates their health.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::cleaner::health::{first_unhealthy, HealthReporter};
use crate::cleaner::metrics::MetricsSink;
use crate::cleaner::task::CleanupTask;
use crate::config::TaskConfig;
use crate::error::{CleanerError, Result};

// == Folder Cleaner ==
/// The set of cleanup tasks built from the configuration.
///
/// All loops share one cancellation token; the tracker lets [`shutdown`]
/// wait until each of them has exited.
///
/// [`shutdown`]: FolderCleaner::shutdown
#[derive(Debug)]
pub struct FolderCleaner {
    tasks: Vec<Arc<CleanupTask>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl FolderCleaner {
    // == Constructor ==
    /// Builds one task per config entry.
    ///
    /// Entries that fail to build (bad pattern) are logged and left out.
    pub fn new(configs: &[TaskConfig], sink: Arc<dyn MetricsSink>, shutdown: CancellationToken) -> Self {
        let mut tasks = Vec::with_capacity(configs.len());
        for config in configs {
            match CleanupTask::new(config.clone(), Arc::clone(&sink)) {
                Ok(task) => tasks.push(Arc::new(task)),
                Err(err) => {
                    error!(path = %config.path.display(), error = %err, "When creating cleaner task");
                }
            }
        }

        Self {
            tasks,
            shutdown,
            tracker: TaskTracker::new(),
        }
    }

    // == Schedule ==
    /// Schedules every task in order, stopping at the first failure.
    ///
    /// Tasks before the failing one keep running; [`scheduled`] shows which.
    ///
    /// [`scheduled`]: FolderCleaner::scheduled
    pub fn schedule(&self) -> Result<()> {
        info!(tasks = self.tasks.len(), "Scheduling the folder cleaner");

        for task in &self.tasks {
            task.schedule(&self.shutdown, &self.tracker)
                .map_err(|source| CleanerError::Schedule {
                    task: format!("{:?}", task.config()),
                    source,
                })?;
            info!(path = %task.path().display(), "Scheduled task");
        }
        Ok(())
    }

    /// Every task that was built, scheduled or not.
    pub fn tasks(&self) -> &[Arc<CleanupTask>] {
        &self.tasks
    }

    pub fn task(&self, id: usize) -> Option<&Arc<CleanupTask>> {
        self.tasks.get(id)
    }

    /// Tasks whose loop has been started.
    pub fn scheduled(&self) -> Vec<Arc<CleanupTask>> {
        self.tasks.iter().filter(|task| task.is_scheduled()).cloned().collect()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    // == Shutdown ==
    /// Cancels every loop and waits until all of them have exited.
    ///
    /// A scan in progress is not interrupted; this returns once it finishes.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("All cleaner tasks stopped");
    }
}

impl HealthReporter for FolderCleaner {
    fn is_alive(&self) -> (bool, String) {
        match first_unhealthy(self.tasks.iter(), |task: &Arc<CleanupTask>| task.is_alive()) {
            Some(description) => (false, description),
            None => (true, "All cleaner tasks are alive".to_string()),
        }
    }

    fn is_ready(&self) -> (bool, String) {
        match first_unhealthy(self.tasks.iter(), |task: &Arc<CleanupTask>| task.is_ready()) {
            Some(description) => (false, description),
            None => (true, "All cleaner tasks are ready".to_string()),
        }
    }
}
