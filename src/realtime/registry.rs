//! Set of live realtime connections

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::connection::{Connection, ConnectionId};

/// Registry of currently open realtime channels, keyed by connection id.
///
/// Lives for the whole process; nothing is persisted. Clients rebuild
/// their view by re-fetching after a reconnect.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<dyn Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Add a connection. Registering an id that is already present is a no-op.
    pub fn register(&self, conn: Arc<dyn Connection>) {
        let id = conn.id();
        self.connections.entry(id).or_insert(conn);
        debug!(connection = %id, total = self.len(), "Realtime connection registered");
    }

    /// Remove a connection. Returns whether it was present.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.remove(&id).is_some();
        if removed {
            debug!(connection = %id, total = self.len(), "Realtime connection removed");
        }
        removed
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Clone out the current members so callers can iterate without
    /// holding shard locks.
    pub fn snapshot(&self) -> Vec<Arc<dyn Connection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
