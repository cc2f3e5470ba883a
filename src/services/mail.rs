//! Outgoing mail
//!
//! Mail delivery is best-effort: a failed send is logged and never affects
//! the request that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::Result;

/// A rendered email ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutgoingEmail {
    /// Welcome message sent after signup
    pub fn welcome(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Welcome to Event Management App!".to_string(),
            html: concat!(
                "<h1>Welcome to Event Management App!</h1>\n",
                "<p>Your account has been successfully created.</p>\n",
                "<p>You can now create events, RSVP to events, and receive realtime updates.</p>\n",
            )
            .to_string(),
        }
    }
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Mailer that records messages in the log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        info!(from = %email.from, to = %email.to, subject = %email.subject, "Email queued");
        debug!(body = %email.html, "Email body");
        Ok(())
    }
}

/// Send the welcome email in the background
pub fn send_welcome_email(mailer: Arc<dyn Mailer>, from: &str, to: &str) {
    let email = OutgoingEmail::welcome(from, to);
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            warn!(to = %to, error = %e, "Failed to send welcome email");
        }
    });
}
