//! Metrics Module
//!
//! Counters are reported through a [`MetricsSink`] handed to each task, so
//! tasks never touch a global registry directly.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;

use crate::error::CleanerError;

pub const REMOVED_FILES: &str = "foldercleaner_removed_files_count";
pub const CLEAN_FOLDER_FAILURES: &str = "foldercleaner_clean_folder_failures_count";
pub const REMOVE_FILE_FAILURES: &str = "foldercleaner_remove_file_failures_count";

// == Task Labels ==
/// The `{path, pattern}` label pair identifying a task's counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaskLabels {
    pub path: String,
    /// Empty when the task has no pattern
    pub pattern: String,
}

impl TaskLabels {
    pub fn new(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pattern: pattern.into(),
        }
    }
}

// == Metrics Sink ==
/// Destination for a task's counters.
pub trait MetricsSink: Send + Sync {
    /// Creates the series for `labels` so they export as zero before the first event.
    fn register(&self, _labels: &TaskLabels) {}

    fn increment_removed(&self, labels: &TaskLabels);

    fn increment_remove_failure(&self, labels: &TaskLabels);

    fn increment_scan_failure(&self, labels: &TaskLabels);
}

// == Prometheus Sink ==
/// Records through the `metrics` facade for the Prometheus exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn register(&self, labels: &TaskLabels) {
        for name in [REMOVED_FILES, CLEAN_FOLDER_FAILURES, REMOVE_FILE_FAILURES] {
            counter!(name, "path" => labels.path.clone(), "pattern" => labels.pattern.clone())
                .increment(0);
        }
    }

    fn increment_removed(&self, labels: &TaskLabels) {
        counter!(REMOVED_FILES, "path" => labels.path.clone(), "pattern" => labels.pattern.clone())
            .increment(1);
    }

    fn increment_remove_failure(&self, labels: &TaskLabels) {
        counter!(REMOVE_FILE_FAILURES, "path" => labels.path.clone(), "pattern" => labels.pattern.clone())
            .increment(1);
    }

    fn increment_scan_failure(&self, labels: &TaskLabels) {
        counter!(CLEAN_FOLDER_FAILURES, "path" => labels.path.clone(), "pattern" => labels.pattern.clone())
            .increment(1);
    }
}

/// Installs the global Prometheus recorder and describes the counters.
///
/// Returns the handle used to render the `/metrics` endpoint.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, CleanerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CleanerError::Metrics(e.to_string()))?;

    describe_counter!(REMOVED_FILES, "Number of files Removed");
    describe_counter!(
        CLEAN_FOLDER_FAILURES,
        "Number of times the clean folders operation has failed"
    );
    describe_counter!(REMOVE_FILE_FAILURES, "Number of file remove failures");
    tracing::debug!("Prometheus recorder installed");

    Ok(handle)
}

// == Recording Sink ==
/// Per-label counter values held by [`RecordingSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub removed: u64,
    pub remove_failures: u64,
    pub scan_failures: u64,
}

/// In-memory sink, used where no exporter is installed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    counts: Mutex<HashMap<TaskLabels, TaskCounts>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counters for `labels`; zero when never touched.
    pub fn counts(&self, labels: &TaskLabels) -> TaskCounts {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(labels).copied().unwrap_or_default()
    }

    fn update(&self, labels: &TaskLabels, apply: impl FnOnce(&mut TaskCounts)) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        apply(counts.entry(labels.clone()).or_default());
    }
}

impl MetricsSink for RecordingSink {
    fn register(&self, labels: &TaskLabels) {
        self.update(labels, |_| {});
    }

    fn increment_removed(&self, labels: &TaskLabels) {
        self.update(labels, |c| c.removed += 1);
    }

    fn increment_remove_failure(&self, labels: &TaskLabels) {
        self.update(labels, |c| c.remove_failures += 1);
    }

    fn increment_scan_failure(&self, labels: &TaskLabels) {
        self.update(labels, |c| c.scan_failures += 1);
    }
}
