//! Grafana Cleanup - periodic maintenance for a Grafana-style server
//!
//! Runs the cleanup loop against the configured SQLite database and images
//! directory until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grafana_cleanup::lock::SqliteServerLock;
use grafana_cleanup::store::SqliteStore;
use grafana_cleanup::{spawn_cleanup_task, CleanupService, Config};

/// Main entry point for the cleanup service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the SQLite store and server lock
/// 4. Start the background cleanup task
/// 5. Cancel on SIGINT/SIGTERM and wait for the in-flight tick to finish
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grafana_cleanup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Grafana cleanup service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: images_dir={}, temp_data_lifetime={}s, invite_lifetime={}d, interval={}s",
        config.images_dir.display(),
        config.temp_data_lifetime.as_secs(),
        config.user_invite_max_lifetime_days,
        config.cleanup_interval.as_secs()
    );

    let store = SqliteStore::new(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;
    let lock = SqliteServerLock::new(&config.database_path)
        .context("Failed to open server lock table")?;

    let service = CleanupService::new(config, Arc::new(store), Arc::new(lock));
    let shutdown = CancellationToken::new();
    let handle = spawn_cleanup_task(Arc::new(service), shutdown.clone());
    info!("Background cleanup task started");

    shutdown_signal().await;
    shutdown.cancel();

    let reason = handle.await.context("Cleanup task panicked")?;
    info!("Cleanup service stopped: {}", reason);

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
    }
}
