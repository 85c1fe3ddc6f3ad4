//! Background Tasks Module
//!
//! Contains the recurring loop that drives each cleanup task.
//!
//! # Tasks
//! - Folder cleanup: scans a folder immediately, then once per interval,
//!   until the shared cancellation token fires

mod scheduler;

pub use scheduler::spawn_cleanup_loop;
