//! Error types for the folder cleaner
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Config Error Enum ==
/// Errors raised while loading the cleanup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("when reading configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid YAML for the expected schema
    #[error("when parsing configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration parsed but failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// == Cleaner Error Enum ==
/// Errors raised while building or scheduling cleanup tasks.
#[derive(Error, Debug)]
pub enum CleanerError {
    /// The filename pattern is not a valid regular expression
    #[error("converting the file pattern '{pattern}' to a regular expression: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A task could not be scheduled
    #[error("when scheduling task {task}: {source}")]
    Schedule {
        task: String,
        #[source]
        source: ScheduleError,
    },

    /// The metrics recorder could not be installed
    #[error("when installing metrics recorder: {0}")]
    Metrics(String),
}

// == Schedule Error Enum ==
/// Setup failures detected before a task loop starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Both ttl and interval are zero, so there is no tick period
    #[error("effective interval for {} is zero", .0.display())]
    ZeroInterval(PathBuf),

    /// The task already has a running loop
    #[error("task for {} is already scheduled", .0.display())]
    AlreadyScheduled(PathBuf),

    /// The shared cancellation signal has already fired
    #[error("shutdown already requested, not scheduling {}", .0.display())]
    ShutdownRequested(PathBuf),

    /// Called outside a Tokio runtime
    #[error("no async runtime available to schedule {}", .0.display())]
    NoRuntime(PathBuf),
}

// == Scan Error Enum ==
/// Failures that abort a single scan pass.
///
/// Every variant is recovered by the scheduler loop: the task is marked
/// unhealthy and the next tick scans again.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root folder is missing, unreadable or not a folder
    #[error("when reading files in folder {}: {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry below the root could not be inspected
    #[error("there was an error investigating the file {}: {source}", .path.display())]
    Investigation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A deletion candidate could not be removed
    #[error("error trying to delete the file {}: {source}", .path.display())]
    Deletion {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scan exceeded the configured deadline
    #[error("scan of {} did not finish within {after:?}", .path.display())]
    Timeout { path: PathBuf, after: Duration },

    /// A previous scan that timed out is still running
    #[error("previous scan of {} is still running", .0.display())]
    Stalled(PathBuf),

    /// The blocking scan worker panicked or was cancelled
    #[error("scan of {} aborted: {reason}", .path.display())]
    Aborted { path: PathBuf, reason: String },
}

impl ScanError {
    /// Short category used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::DirectoryRead { .. } => "directory_read",
            ScanError::Investigation { .. } => "investigation",
            ScanError::Deletion { .. } => "deletion",
            ScanError::Timeout { .. } => "timeout",
            ScanError::Stalled(_) => "stalled",
            ScanError::Aborted { .. } => "aborted",
        }
    }
}

// == API Error Enum ==
/// Errors surfaced by the HTTP health API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No task exists at the requested index
    #[error("Task not found: {0}")]
    TaskNotFound(usize),

    /// No Prometheus recorder was installed
    #[error("Metrics are not enabled")]
    MetricsDisabled,
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MetricsDisabled => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the folder cleaner.
pub type Result<T> = std::result::Result<T, CleanerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_kinds_are_distinct() {
        let path = PathBuf::from("/tmp/x");
        let investigation = ScanError::Investigation {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let deletion = ScanError::Deletion {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(investigation.kind(), "investigation");
        assert_eq!(deletion.kind(), "deletion");
        assert!(investigation.to_string().contains("investigating"));
        assert!(deletion.to_string().contains("delete"));
    }

    #[test]
    fn test_directory_read_error_names_path() {
        let err = ScanError::DirectoryRead {
            path: PathBuf::from("/does/not/exist"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/does/not/exist"));
        assert_eq!(err.kind(), "directory_read");
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError::TaskNotFound(3).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
