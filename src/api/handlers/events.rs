//! Event management handlers
//!
//! Every successful mutation is pushed to realtime subscribers after the
//! database write commits.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use super::current_user;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthenticatedUser;
use crate::api::server::AppState;
use crate::error::GatherError;
use crate::models::{ApiResponse, CreateEventRequest, UpdateEventRequest};
use crate::repository::EventRepository;

fn event_not_found() -> GatherError {
    GatherError::NotFound("Event not found".to_string())
}

/// List approved events with organizers and RSVPs
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, GatherError> {
    let repo = EventRepository::new(state.db.pool().clone());
    let events = repo.list_approved().await?;

    Ok(Json(ApiResponse::data(events)))
}

/// Create an event. Admin events are approved immediately.
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> Result<impl IntoResponse, GatherError> {
    req.validate()?;

    let user = current_user(&state, &auth).await?;
    if !user.role.can_create_events() {
        return Err(GatherError::Forbidden("Insufficient permissions".to_string()));
    }

    let repo = EventRepository::new(state.db.pool().clone());
    let event = repo.create(user.id, &req, user.role.is_admin()).await?;

    state.broadcaster.event_created(&event);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Event created successfully", event)),
    ))
}

/// Update an event owned by the caller (or any event, for admins)
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> Result<impl IntoResponse, GatherError> {
    req.validate()?;

    let user = current_user(&state, &auth).await?;
    let repo = EventRepository::new(state.db.pool().clone());

    let existing = repo.get_by_id(id).await?.ok_or_else(event_not_found)?;
    if !user.can_manage_event(existing.organizer_id) {
        return Err(GatherError::Forbidden("Insufficient permissions".to_string()));
    }

    let event = repo.update(id, &req).await?.ok_or_else(event_not_found)?;

    state.broadcaster.event_updated(&event);

    Ok(Json(ApiResponse::with_message("Event updated successfully", event)))
}

/// Delete an event along with its RSVPs
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatherError> {
    let user = current_user(&state, &auth).await?;
    let repo = EventRepository::new(state.db.pool().clone());

    let existing = repo.get_by_id(id).await?.ok_or_else(event_not_found)?;
    if !user.can_manage_event(existing.organizer_id) {
        return Err(GatherError::Forbidden("Insufficient permissions".to_string()));
    }

    if !repo.delete(id).await? {
        return Err(event_not_found());
    }

    state.broadcaster.event_deleted(id);

    Ok(Json(ApiResponse::message("Event deleted successfully")))
}

/// Approve a pending event (admin only)
pub async fn approve_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatherError> {
    let user = current_user(&state, &auth).await?;
    if !user.role.is_admin() {
        return Err(GatherError::Forbidden("Admin access required".to_string()));
    }

    let repo = EventRepository::new(state.db.pool().clone());
    let event = repo.approve(id).await?.ok_or_else(event_not_found)?;

    info!(event_id = %id, admin_id = %user.id, "Event approved");

    state.broadcaster.event_updated(&event);

    Ok(Json(ApiResponse::with_message("Event approved successfully", event)))
}
