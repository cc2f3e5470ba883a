//! Gather API Server - Entry Point
//!
//! Starts the API server with graceful shutdown support.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gather::api::{ApiServer, AppState};
use gather::config::LogConfig;
use gather::realtime::{Broadcaster, ConnectionRegistry};
use gather::services::LogMailer;
use gather::{Config, Database};

#[tokio::main]
async fn main() -> gather::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&config.log);

    info!("Starting Gather API Server");
    info!("Configuration loaded");

    // Connect to database
    let db = Database::new(&config).await?;
    info!("Connected to database");

    // Run migrations
    db.run_migrations().await?;
    info!("Database migrations complete");

    // Realtime fan-out shared by all handlers
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Broadcaster::new(registry);

    let state = AppState::new(config, db.clone(), broadcaster, Arc::new(LogMailer));
    let api_server = ApiServer::new(state);

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    api_server.run(shutdown_rx).await?;

    db.close().await;

    info!("Gather API Server stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("gather={},tower_http=debug", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if log.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
