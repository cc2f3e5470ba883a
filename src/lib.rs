//! Gather - Event Management API
//!
//! A collaborative event management backend with realtime updates.
//!
//! ## Features
//!
//! - Email and password accounts with attendee, organizer and admin roles
//! - JWT bearer-token authentication
//! - Event creation, editing and admin approval
//! - One RSVP per user and event, replaced on every response
//! - WebSocket fan-out of every event and RSVP change to connected clients
//! - PostgreSQL storage with embedded migrations

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod realtime;
pub mod repository;
pub mod services;

pub use config::Config;
pub use database::Database;
pub use error::{GatherError, Result};
