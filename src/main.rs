//! Folder Cleaner - A housekeeping daemon
//!
//! Periodically removes files older than a configured TTL from one or more
//! folders.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folder_cleaner::api::{create_router, AppState};
use folder_cleaner::cleaner::{install_prometheus_recorder, FolderCleaner, PrometheusSink};
use folder_cleaner::config::{Configuration, Settings};

/// Main entry point for the folder cleaner daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load settings from environment variables
/// 3. Load the task list from the YAML configuration file
/// 4. Install the Prometheus recorder
/// 5. Build and schedule every cleanup task
/// 6. Serve the health and metrics endpoints
/// 7. On SIGINT/SIGTERM, cancel every task and wait for them to stop
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folder_cleaner=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folder Cleaner");

    let settings = Settings::from_env();
    let configuration = Configuration::from_file(&settings.config_path)
        .with_context(|| format!("loading {}", settings.config_path.display()))?;
    info!(
        "Configuration loaded: tasks={}, port={}",
        configuration.tasks.len(),
        settings.server_port
    );

    let metrics = install_prometheus_recorder()?;

    let shutdown = CancellationToken::new();
    let cleaner = Arc::new(FolderCleaner::new(
        &configuration.tasks,
        Arc::new(PrometheusSink),
        shutdown.clone(),
    ));
    if let Err(err) = cleaner.schedule() {
        error!(error = %err, "When scheduling the cleaner");
        cleaner.shutdown().await;
        return Err(err.into());
    }
    info!("Cleaner tasks scheduled");

    let app = create_router(AppState::new(cleaner.clone(), Some(metrics)));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("serving health endpoints")?;

    cleaner.shutdown().await;
    info!("Folder cleaner shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, fires the shared cancellation token so every cleanup
/// loop stops at its next wait point.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
