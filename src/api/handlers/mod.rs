//! API request handlers

pub mod auth;
pub mod events;
pub mod health;
pub mod rsvp;

use crate::api::middleware::AuthenticatedUser;
use crate::api::server::AppState;
use crate::error::{GatherError, Result};
use crate::models::User;
use crate::repository::UserRepository;

/// Reload the caller's account so role changes and deletions take effect
/// before the token expires.
pub(crate) async fn current_user(state: &AppState, auth: &AuthenticatedUser) -> Result<User> {
    UserRepository::new(state.db.pool().clone())
        .get_by_id(auth.user_id)
        .await?
        .ok_or(GatherError::AuthenticationRequired)
}
