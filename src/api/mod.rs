//! API Module
//!
//! HTTP handlers and routing for the health and metrics surface.
//!
//! # Endpoints
//! - `GET /health/live` - Liveness across all tasks
//! - `GET /health/ready` - Readiness across all tasks
//! - `GET /tasks` - Health and configuration of every task
//! - `GET /tasks/:id` - Health and configuration of one task
//! - `GET /metrics` - Prometheus exposition

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
