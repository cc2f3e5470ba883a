//! API server using Axum
//!
//! Serves the REST API and the realtime WebSocket endpoint.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRef;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::database::Database;
use crate::error::{GatherError, Result};
use crate::realtime::Broadcaster;
use crate::services::Mailer;

use super::middleware::{cors_layer, JwtAuth};
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub jwt_auth: JwtAuth,
    pub broadcaster: Broadcaster,
    pub mailer: Arc<dyn Mailer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        broadcaster: Broadcaster,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt_auth = JwtAuth::new(&config.api.jwt_secret, config.api.jwt_expiry_hours);

        Self {
            db,
            config,
            jwt_auth,
            broadcaster,
            mailer,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for JwtAuth {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_auth.clone()
    }
}

/// API server
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all middleware applied
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Run the API server until `shutdown` flips
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let api = &self.state.config.api;
        let listener = bind_listener(&api.host, api.port, api.port_scan_end).await?;
        let addr = listener.local_addr()?;

        let router = self.build_router();

        info!("API server listening on http://{}", addr);
        info!("Realtime updates at ws://{}/ws", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| GatherError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}

/// Build the application router from its state
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.api.cors_origins);
    let timeout = Duration::from_secs(state.config.api.request_timeout);

    routes::create_router(state)
        .layer(cors)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

/// Bind `host:port`, moving on to the next port while the current one is
/// taken and still below `scan_end`.
pub async fn bind_listener(host: &str, port: u16, scan_end: u16) -> Result<TcpListener> {
    let mut candidate = port;

    loop {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if candidate != port {
                    info!(requested = port, bound = candidate, "Found available port");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let next = candidate.checked_add(1).filter(|next| *next < scan_end);
                match next {
                    Some(next) => {
                        warn!(port = candidate, "Port in use, trying {}", next);
                        candidate = next;
                    }
                    None => {
                        return Err(GatherError::Io(io::Error::new(
                            io::ErrorKind::AddrInUse,
                            format!("No available ports between {} and {}", port, scan_end),
                        )))
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_skips_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let listener = bind_listener("127.0.0.1", port, port.saturating_add(20))
            .await
            .unwrap();
        let bound = listener.local_addr().unwrap().port();

        assert_ne!(bound, port);
        assert!(bound > port);
    }

    #[tokio::test]
    async fn test_bind_listener_without_scan_range_fails() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_listener("127.0.0.1", port, port).await.unwrap_err();
        assert!(matches!(err, GatherError::Io(ref e) if e.kind() == io::ErrorKind::AddrInUse));
    }

    #[tokio::test]
    async fn test_router_builds_from_state() {
        let state = test_support::test_state();
        let server = ApiServer::new(state.clone());
        let _router = server.build_router();

        assert_eq!(state.broadcaster.connection_count(), 0);
        assert!(JwtAuth::from_ref(&state)
            .validate_token("garbage")
            .is_err());
    }
}
