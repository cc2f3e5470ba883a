use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the Gather application
#[derive(Error, Debug)]
pub enum GatherError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Domain errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidRequest(String),

    // Authentication errors
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Gather operations
pub type Result<T> = std::result::Result<T, GatherError>;

impl GatherError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            GatherError::InvalidRequest(_) | GatherError::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            GatherError::AuthenticationRequired
            | GatherError::InvalidCredentials
            | GatherError::JwtError(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            GatherError::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            GatherError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            GatherError::Conflict(_) => StatusCode::CONFLICT,

            // 503 Service Unavailable
            GatherError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            GatherError::Database(_)
            | GatherError::PasswordHash(_)
            | GatherError::Io(_)
            | GatherError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for GatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internals stay in the log, not in the response body.
        let message = if self.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Unreadable or mistyped request bodies are validation failures
impl From<JsonRejection> for GatherError {
    fn from(rejection: JsonRejection) -> Self {
        GatherError::InvalidRequest(rejection.body_text())
    }
}
