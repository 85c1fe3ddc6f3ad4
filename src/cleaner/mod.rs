//! Cleaner Module
//!
//! Folder cleanup tasks, their health and their counters.

mod folder_cleaner;
pub mod health;
pub mod metrics;
mod pattern;
mod task;


// Re-export public types
pub use folder_cleaner::FolderCleaner;
pub use health::{HealthRecord, HealthReporter};
pub use self::metrics::{install_prometheus_recorder, MetricsSink, PrometheusSink, RecordingSink, TaskCounts, TaskLabels};
pub use pattern::PatternMatcher;
pub use task::{is_deletion_candidate, CleanupTask, ScanStats};
