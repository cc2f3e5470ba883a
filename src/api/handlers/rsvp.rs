//! RSVP handler

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use super::current_user;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthenticatedUser;
use crate::api::server::AppState;
use crate::error::GatherError;
use crate::models::{ApiResponse, RsvpRequest, RsvpWithRelations};
use crate::repository::{EventRepository, RsvpRepository};

/// Create or replace the caller's RSVP to an approved event
pub async fn rsvp_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(event_id): Path<Uuid>,
    ApiJson(req): ApiJson<RsvpRequest>,
) -> Result<impl IntoResponse, GatherError> {
    let user = current_user(&state, &auth).await?;
    let events = EventRepository::new(state.db.pool().clone());

    let event = events
        .get_with_organizer(event_id)
        .await?
        .filter(|e| e.event.approved)
        .ok_or_else(|| GatherError::NotFound("Event not found or not approved".to_string()))?;

    let rsvp = RsvpRepository::new(state.db.pool().clone())
        .upsert(user.id, event_id, req.status)
        .await?;

    info!(event_id = %event_id, user_id = %user.id, status = %rsvp.status, "RSVP recorded");

    let rsvp = RsvpWithRelations {
        rsvp,
        user: user.summary(),
        event,
    };

    state.broadcaster.rsvp_updated(&rsvp);

    Ok(Json(ApiResponse::with_message("RSVP updated successfully", rsvp)))
}
