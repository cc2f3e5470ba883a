//! Signup and login handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use crate::api::extract::ApiJson;
use crate::api::server::AppState;
use crate::error::GatherError;
use crate::models::{normalize_email, ApiResponse, AuthPayload, LoginRequest, SignupRequest};
use crate::repository::UserRepository;
use crate::services::{hash_password, send_welcome_email, verify_password};

/// Register a new account and sign it in
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, GatherError> {
    let role = req.validate()?;

    if role.is_admin() && !state.config.api.allow_admin_signup {
        warn!("Rejected self-service admin signup");
        return Err(GatherError::Forbidden(
            "Admin accounts cannot be created through signup".to_string(),
        ));
    }

    let email = normalize_email(&req.email);
    let repo = UserRepository::new(state.db.pool().clone());

    if repo.find_by_email(&email).await?.is_some() {
        return Err(GatherError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(req.password).await?;
    let user = repo.create(&email, &password_hash, role).await?;

    send_welcome_email(state.mailer.clone(), &state.config.mail.from, &user.email);

    let token = state.jwt_auth.generate_token(&user)?;

    info!(user_id = %user.id, role = %user.role, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            AuthPayload {
                user: user.public(),
                token,
            },
        )),
    ))
}

/// Exchange email and password for a token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, GatherError> {
    let email = normalize_email(&req.email);
    let repo = UserRepository::new(state.db.pool().clone());

    let Some(user) = repo.find_by_email(&email).await? else {
        warn!("Login failed: unknown account");
        return Err(GatherError::InvalidCredentials);
    };

    if !verify_password(req.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(GatherError::InvalidCredentials);
    }

    let token = state.jwt_auth.generate_token(&user)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        AuthPayload {
            user: user.public(),
            token,
        },
    )))
}
