//! Realtime change notifications
//!
//! Tracks open WebSocket channels and fans out mutation notifications to
//! them.

mod broadcaster;
mod connection;
mod registry;

pub use broadcaster::{BroadcastEvent, Broadcaster, DeletedEvent};
pub use connection::{ChannelConnection, Connection, ConnectionId, SendError};
pub use registry::ConnectionRegistry;
