//! Request extractors

use axum::extract::FromRequest;

use crate::error::GatherError;

/// JSON request body. Malformed or mistyped bodies are rejected with the
/// API error envelope and a 400.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(GatherError))]
pub struct ApiJson<T>(pub T);
