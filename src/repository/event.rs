use std::collections::HashMap;

use crate::error::Result;
use crate::models::{
    CreateEventRequest, Event, EventRow, EventWithOrganizer, EventWithRsvps, RsvpWithUser,
    UpdateEventRequest, UserSummary,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::RsvpRepository;

/// Repository for event database operations
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get an event by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, date, location, approved,
                   organizer_id, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Get an event together with its organizer
    pub async fn get_with_organizer(&self, id: Uuid) -> Result<Option<EventWithOrganizer>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.title, e.description, e.date, e.location, e.approved,
                   e.organizer_id, e.created_at, e.updated_at,
                   u.email AS organizer_email
            FROM events e
            JOIN users u ON u.id = e.organizer_id
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EventWithOrganizer::from))
    }

    /// List approved events by date, each with organizer and RSVPs
    pub async fn list_approved(&self) -> Result<Vec<EventWithRsvps>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.title, e.description, e.date, e.location, e.approved,
                   e.organizer_id, e.created_at, e.updated_at,
                   u.email AS organizer_email
            FROM events e
            JOIN users u ON u.id = e.organizer_id
            WHERE e.approved = true
            ORDER BY e.date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.event.id).collect();
        let rsvp_rows = RsvpRepository::new(self.pool.clone())
            .list_for_events(&ids)
            .await?;

        let mut rsvps_by_event: HashMap<Uuid, Vec<RsvpWithUser>> = HashMap::new();
        for row in rsvp_rows {
            rsvps_by_event
                .entry(row.rsvp.event_id)
                .or_default()
                .push(RsvpWithUser::from(row));
        }

        let events = rows
            .into_iter()
            .map(|row| {
                let rsvps = rsvps_by_event.remove(&row.event.id).unwrap_or_default();
                EventWithRsvps {
                    organizer: UserSummary {
                        id: row.event.organizer_id,
                        email: row.organizer_email,
                    },
                    event: row.event,
                    rsvps,
                }
            })
            .collect();

        Ok(events)
    }

    /// Create an event
    pub async fn create(
        &self,
        organizer_id: Uuid,
        req: &CreateEventRequest,
        approved: bool,
    ) -> Result<EventWithOrganizer> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            WITH inserted AS (
                INSERT INTO events (id, title, description, date, location, approved, organizer_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT i.id, i.title, i.description, i.date, i.location, i.approved,
                   i.organizer_id, i.created_at, i.updated_at,
                   u.email AS organizer_email
            FROM inserted i
            JOIN users u ON u.id = i.organizer_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title.trim())
        .bind(req.description.trim())
        .bind(req.date)
        .bind(req.location.trim())
        .bind(approved)
        .bind(organizer_id)
        .fetch_one(&self.pool)
        .await?;

        info!(id = %row.event.id, approved = approved, "Created event");

        Ok(row.into())
    }

    /// Apply a partial update. Returns `None` if the event does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateEventRequest,
    ) -> Result<Option<EventWithOrganizer>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            WITH updated AS (
                UPDATE events SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    date = COALESCE($4, date),
                    location = COALESCE($5, location)
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.title, d.description, d.date, d.location, d.approved,
                   d.organizer_id, d.created_at, d.updated_at,
                   u.email AS organizer_email
            FROM updated d
            JOIN users u ON u.id = d.organizer_id
            "#,
        )
        .bind(id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.description.as_deref().map(str::trim))
        .bind(req.date)
        .bind(req.location.as_deref().map(str::trim))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = &row {
            info!(id = %row.event.id, "Updated event");
        }

        Ok(row.map(EventWithOrganizer::from))
    }

    /// Mark an event approved. Returns `None` if the event does not exist.
    pub async fn approve(&self, id: Uuid) -> Result<Option<EventWithOrganizer>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            WITH updated AS (
                UPDATE events SET approved = true
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.title, d.description, d.date, d.location, d.approved,
                   d.organizer_id, d.created_at, d.updated_at,
                   u.email AS organizer_email
            FROM updated d
            JOIN users u ON u.id = d.organizer_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            info!(id = %id, "Approved event");
        }

        Ok(row.map(EventWithOrganizer::from))
    }

    /// Delete an event and, by cascade, its RSVPs
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id = %id, "Deleted event");
        }
        Ok(deleted)
    }
}
