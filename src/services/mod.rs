//! Supporting services used by the request handlers

pub mod mail;
pub mod password;

pub use mail::{send_welcome_email, LogMailer, Mailer, OutgoingEmail};
pub use password::{hash_password, verify_password};
