//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::cleaner::{FolderCleaner, HealthReporter};
use crate::error::ApiError;
use crate::models::{HealthResponse, TaskResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The running cleaner
    pub cleaner: Arc<FolderCleaner>,
    /// Renders `/metrics`; `None` when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new AppState around a cleaner.
    pub fn new(cleaner: Arc<FolderCleaner>, metrics: Option<PrometheusHandle>) -> Self {
        Self { cleaner, metrics }
    }
}

fn probe_status(response: HealthResponse) -> (StatusCode, Json<HealthResponse>) {
    let status = if response.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Handler for GET /health/live
///
/// 200 when every task is alive, 503 with the first failure otherwise.
pub async fn liveness_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    probe_status(HealthResponse::new(state.cleaner.is_alive()))
}

/// Handler for GET /health/ready
pub async fn readiness_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    probe_status(HealthResponse::new(state.cleaner.is_ready()))
}

/// Handler for GET /tasks
pub async fn tasks_handler(State(state): State<AppState>) -> Json<Vec<TaskResponse>> {
    let tasks = state
        .cleaner
        .tasks()
        .iter()
        .enumerate()
        .map(|(id, task)| TaskResponse::from_task(id, task))
        .collect();
    Json(tasks)
}

/// Handler for GET /tasks/:id
pub async fn task_handler(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.cleaner.task(id).ok_or(ApiError::TaskNotFound(id))?;
    Ok(Json(TaskResponse::from_task(id, task)))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, ApiError> {
    let handle = state.metrics.as_ref().ok_or(ApiError::MetricsDisabled)?;
    Ok(handle.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::RecordingSink;
    use crate::config::TaskConfig;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn state_with(configs: &[TaskConfig]) -> AppState {
        let cleaner = FolderCleaner::new(configs, Arc::new(RecordingSink::new()), CancellationToken::new());
        AppState::new(Arc::new(cleaner), None)
    }

    #[tokio::test]
    async fn test_liveness_without_tasks() {
        let (status, response) = liveness_handler(State(state_with(&[]))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.healthy);
    }

    #[tokio::test]
    async fn test_readiness_before_schedule() {
        let state = state_with(&[TaskConfig::new("/tmp", Duration::from_secs(60))]);
        let (status, response) = readiness_handler(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.message, "Not yet started");
    }

    #[tokio::test]
    async fn test_tasks_handler_lists_all() {
        let state = state_with(&[
            TaskConfig::new("/tmp/a", Duration::from_secs(60)),
            TaskConfig::new("/tmp/b", Duration::from_secs(60)).with_recursive(true),
        ]);
        let response = tasks_handler(State(state)).await;
        assert_eq!(response.len(), 2);
        assert_eq!(response[1].id, 1);
        assert!(response[1].config.recursive);
    }

    #[tokio::test]
    async fn test_task_handler_not_found() {
        let result = task_handler(State(state_with(&[])), Path(0)).await;
        assert!(matches!(result, Err(ApiError::TaskNotFound(0))));
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let result = metrics_handler(State(state_with(&[]))).await;
        assert!(matches!(result, Err(ApiError::MetricsDisabled)));
    }
}
