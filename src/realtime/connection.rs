//! Realtime connection handles

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one realtime channel. A reconnect always gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a message could not be handed to a connection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("connection buffer full")]
    Full,
}

/// One open realtime channel as seen by the registry.
///
/// `try_send` must not block: it only enqueues the message for the
/// transport. Any error is treated as the connection having closed.
pub trait Connection: Send + Sync {
    /// Stable identity of this connection
    fn id(&self) -> ConnectionId;

    /// Observed open state of the underlying channel
    fn is_open(&self) -> bool;

    /// Hand a serialized message to the transport without waiting
    fn try_send(&self, message: Arc<str>) -> Result<(), SendError>;
}

/// Connection backed by a bounded queue drained by a socket writer task
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelConnection {
    /// Create a connection and the receiving end its writer task drains
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer);
        let conn = Self {
            id: ConnectionId::new(),
            tx,
        };
        (conn, rx)
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn try_send(&self, message: Arc<str>) -> Result<(), SendError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[tokio::test]
    async fn test_channel_connection_delivers_in_order() {
        let (conn, mut rx) = ChannelConnection::new(4);

        conn.try_send(Arc::from("first")).unwrap();
        conn.try_send(Arc::from("second")).unwrap();

        assert_eq!(&*rx.recv().await.unwrap(), "first");
        assert_eq!(&*rx.recv().await.unwrap(), "second");
    }

    #[test]
    fn test_channel_connection_closes_with_receiver() {
        let (conn, rx) = ChannelConnection::new(4);
        assert!(conn.is_open());

        drop(rx);

        assert!(!conn.is_open());
        assert_eq!(conn.try_send(Arc::from("late")), Err(SendError::Closed));
    }

    #[test]
    fn test_channel_connection_reports_full_buffer() {
        let (conn, _rx) = ChannelConnection::new(1);

        conn.try_send(Arc::from("one")).unwrap();
        assert_eq!(conn.try_send(Arc::from("two")), Err(SendError::Full));
    }
}
