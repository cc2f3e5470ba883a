//! API server implementation
//!
//! Provides the REST API for users, events and RSVPs plus the realtime
//! WebSocket endpoint.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::{ApiServer, AppState};
