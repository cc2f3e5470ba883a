//! JWT bearer-token authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{GatherError, Result};
use crate::models::{User, UserRole};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Create new claims for a user
    pub fn new(user: &User, expiry_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// JWT authentication handler
#[derive(Clone)]
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtAuth {
    /// Create a new JWT auth handler
    ///
    /// An empty secret gets replaced by 32 random bytes, so tokens do not
    /// survive a restart.
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        let key = if secret.is_empty() {
            let mut key_bytes = [0u8; 32];
            OsRng
                .try_fill_bytes(&mut key_bytes)
                .expect("FATAL: Failed to generate secure random JWT key. System entropy may be unavailable.");

            debug!("Generated random JWT secret");
            key_bytes.to_vec()
        } else {
            secret.as_bytes().to_vec()
        };

        Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            expiry_hours,
        }
    }

    /// Generate a JWT token for the given user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let claims = Claims::new(user, self.expiry_hours);

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to generate JWT: {}", e);
            GatherError::from(e)
        })
    }

    /// Validate a JWT token and return the claims
    pub fn validate_token(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("JWT validation failed: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Extract token from Authorization header
    pub fn extract_token(authorization: &str) -> Option<&str> {
        authorization
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Rejections of the bearer-token extractor
#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    MissingToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::InvalidToken => "Invalid token",
            AuthError::MissingToken => "Authentication required",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

/// Extractor for authenticated requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    JwtAuth: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = JwtAuth::extract_token(auth_header).ok_or(AuthError::MissingToken)?;

        let jwt_auth = JwtAuth::from_ref(state);
        let claims = jwt_auth.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser { user_id, claims })
    }
}
