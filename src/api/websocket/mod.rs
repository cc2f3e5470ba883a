//! WebSocket handlers
//!
//! Each socket is fed from a bounded queue; the broadcaster never waits on
//! a slow client.

pub mod updates;

/// Maximum number of messages to buffer per WebSocket connection
pub const WS_BUFFER_SIZE: usize = 256;
