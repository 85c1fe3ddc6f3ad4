//! Folder Cleaner - A housekeeping daemon
//!
//! Periodically removes files older than a configured TTL from one or more
//! folders, and reports per-task liveness/readiness and counters.

pub mod api;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cleaner::{CleanupTask, FolderCleaner, HealthReporter};
pub use config::{Configuration, Settings, TaskConfig};
pub use tasks::spawn_cleanup_loop;
