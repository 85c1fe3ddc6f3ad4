//! Response DTOs for the health API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cleaner::CleanupTask;
use crate::config::TaskConfig;

/// Response body for the probe endpoints (GET /health/live, GET /health/ready)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Whether every task is healthy
    pub healthy: bool,
    /// First failing task's description, or the all-clear message
    pub message: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new((healthy, message): (bool, String)) -> Self {
        Self {
            healthy,
            message,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Response body describing one task (GET /tasks, GET /tasks/:id)
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    /// Position in the task list
    pub id: usize,
    /// The task as configured
    pub config: TaskConfig,
    /// Whether the scan loop was started
    pub scheduled: bool,
    /// Outcome of the latest scan
    pub healthy: bool,
    pub message: String,
    /// When the health record last changed
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Snapshots a task's configuration and health
    pub fn from_task(id: usize, task: &CleanupTask) -> Self {
        let health = task.health();
        Self {
            id,
            config: task.config().clone(),
            scheduled: task.is_scheduled(),
            healthy: health.is_healthy,
            message: health.description,
            updated_at: health.updated_at,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::RecordingSink;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::new((false, "Not yet started".to_string()));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"healthy\":false"));
        assert!(json.contains("Not yet started"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_task_response_serialize() {
        let config = TaskConfig::new("/var/spool/out", Duration::from_secs(90)).with_pattern(r"\.tmp$");
        let task = CleanupTask::new(config, Arc::new(RecordingSink::new())).unwrap();

        let resp = TaskResponse::from_task(0, &task);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["id"], 0);
        assert_eq!(json["scheduled"], false);
        assert_eq!(json["healthy"], false);
        assert_eq!(json["config"]["path"], "/var/spool/out");
        assert_eq!(json["config"]["ttl"], "1m 30s");
        assert_eq!(json["config"]["recursive"], false);
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
