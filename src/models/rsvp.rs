use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::EventWithOrganizer;
use super::user::UserSummary;

/// RSVP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "GOING",
            RsvpStatus::Maybe => "MAYBE",
            RsvpStatus::NotGoing => "NOT_GOING",
        }
    }
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RSVP entity, unique per (user, event)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// RSVP row joined with the responding user's email
#[derive(Debug, Clone, FromRow)]
pub struct RsvpRow {
    #[sqlx(flatten)]
    pub rsvp: Rsvp,
    pub user_email: String,
}

/// RSVP with the responding user, as embedded in event listings
#[derive(Debug, Clone, Serialize)]
pub struct RsvpWithUser {
    #[serde(flatten)]
    pub rsvp: Rsvp,
    pub user: UserSummary,
}

impl From<RsvpRow> for RsvpWithUser {
    fn from(row: RsvpRow) -> Self {
        let user = UserSummary {
            id: row.rsvp.user_id,
            email: row.user_email,
        };
        Self {
            rsvp: row.rsvp,
            user,
        }
    }
}

/// RSVP with user and event, as returned by the upsert and broadcast
#[derive(Debug, Clone, Serialize)]
pub struct RsvpWithRelations {
    #[serde(flatten)]
    pub rsvp: Rsvp,
    pub user: UserSummary,
    pub event: EventWithOrganizer,
}

/// RSVP request
#[derive(Debug, Clone, Deserialize)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}
