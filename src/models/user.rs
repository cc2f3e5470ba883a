use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{GatherError, Result};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Attendee,
    Organizer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Attendee => "ATTENDEE",
            UserRole::Organizer => "ORGANIZER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ATTENDEE" => Some(UserRole::Attendee),
            "ORGANIZER" => Some(UserRole::Organizer),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Organizers and admins may create events
    pub fn can_create_events(&self) -> bool {
        matches!(self, UserRole::Organizer | UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Admins manage every event; organizers only their own
    pub fn can_manage_event(&self, organizer_id: Uuid) -> bool {
        self.role.is_admin() || self.id == organizer_id
    }
}

/// Identity embedded in event and RSVP representations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

/// User as returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// Signup request
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

impl SignupRequest {
    /// Validate the request and resolve the requested role
    pub fn validate(&self) -> Result<UserRole> {
        validate_email(&self.email)?;

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GatherError::InvalidRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        match self.role.as_deref() {
            None => Ok(UserRole::default()),
            Some(raw) => UserRole::from_str(raw)
                .ok_or_else(|| GatherError::InvalidRequest(format!("Unknown role: {}", raw))),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup and login response payload
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub user: PublicUser,
    pub token: String,
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(GatherError::InvalidRequest(
            "A valid email address is required".to_string(),
        ))
    }
}
