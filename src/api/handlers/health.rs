//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::api::server::AppState;

/// Service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Event Management API is running"
    }))
}

/// Liveness check with the current subscriber count
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "timestamp": Utc::now().to_rfc3339(),
            "connections": state.broadcaster.connection_count()
        })),
    )
}

/// Detailed status including database reachability
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.db.pool_stats();
    let uptime = state.started_at.elapsed().as_secs();
    let connections = state.broadcaster.connection_count();

    match state.db.health_check().await {
        Ok(latency) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "uptime_seconds": uptime,
                "connections": connections,
                "database": {
                    "status": "up",
                    "latency_ms": latency.as_millis() as u64,
                    "pool_size": stats.size,
                    "pool_idle": stats.idle
                }
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "uptime_seconds": uptime,
                    "connections": connections,
                    "database": {
                        "status": "down",
                        "pool_size": stats.size,
                        "pool_idle": stats.idle
                    }
                })),
            )
        }
    }
}
