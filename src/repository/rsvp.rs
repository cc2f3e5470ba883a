use crate::error::{GatherError, Result};
use crate::models::{Rsvp, RsvpRow, RsvpStatus};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Repository for RSVP database operations
#[derive(Clone)]
pub struct RsvpRepository {
    pool: PgPool,
}

impl RsvpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the user's RSVP for an event. An event deleted
    /// concurrently is reported as not found.
    pub async fn upsert(&self, user_id: Uuid, event_id: Uuid, status: RsvpStatus) -> Result<Rsvp> {
        let rsvp = sqlx::query_as::<_, Rsvp>(
            r#"
            INSERT INTO rsvps (id, user_id, event_id, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, event_id)
            DO UPDATE SET status = EXCLUDED.status
            RETURNING id, user_id, event_id, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(upsert_error)?;

        info!(
            id = %rsvp.id,
            user_id = %user_id,
            event_id = %event_id,
            status = %status,
            "Upserted RSVP"
        );

        Ok(rsvp)
    }

    /// RSVPs with user emails for the given events
    pub async fn list_for_events(&self, event_ids: &[Uuid]) -> Result<Vec<RsvpRow>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RsvpRow>(
            r#"
            SELECT r.id, r.user_id, r.event_id, r.status, r.created_at, r.updated_at,
                   u.email AS user_email
            FROM rsvps r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = ANY($1)
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

fn upsert_error(e: sqlx::Error) -> GatherError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("fk_rsvp_event") => {
            GatherError::NotFound("Event not found or not approved".to_string())
        }
        _ => GatherError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct ConstraintViolation {
        constraint: &'static str,
    }

    impl fmt::Display for ConstraintViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint \"{}\"", self.constraint)
        }
    }

    impl StdError for ConstraintViolation {}

    impl DatabaseError for ConstraintViolation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23503"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::ForeignKeyViolation
        }
    }

    fn violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintViolation { constraint }))
    }

    #[test]
    fn test_deleted_event_maps_to_not_found() {
        let err = upsert_error(violation("fk_rsvp_event"));
        assert!(matches!(err, GatherError::NotFound(ref m) if m == "Event not found or not approved"));
    }

    #[test]
    fn test_other_failures_stay_database_errors() {
        assert!(matches!(
            upsert_error(violation("rsvps_user_id_fkey")),
            GatherError::Database(_)
        ));
        assert!(matches!(
            upsert_error(sqlx::Error::RowNotFound),
            GatherError::Database(_)
        ));
    }
}
