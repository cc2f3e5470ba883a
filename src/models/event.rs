use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::rsvp::RsvpWithUser;
use super::user::UserSummary;
use crate::error::{GatherError, Result};

/// Event entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub approved: bool,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event row joined with its organizer's email
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    #[sqlx(flatten)]
    pub event: Event,
    pub organizer_email: String,
}

/// Event with its organizer, as returned by mutations and broadcast
#[derive(Debug, Clone, Serialize)]
pub struct EventWithOrganizer {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: UserSummary,
}

impl From<EventRow> for EventWithOrganizer {
    fn from(row: EventRow) -> Self {
        let organizer = UserSummary {
            id: row.event.organizer_id,
            email: row.organizer_email,
        };
        Self {
            event: row.event,
            organizer,
        }
    }
}

/// Event with organizer and RSVPs, as returned by the listing
#[derive(Debug, Clone, Serialize)]
pub struct EventWithRsvps {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: UserSummary,
    pub rsvps: Vec<RsvpWithUser>,
}

/// Create event request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)
    }
}

/// Update event request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatherError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}
