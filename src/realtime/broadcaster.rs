//! Best-effort fan-out of change notifications
//!
//! Every mutation that commits pushes one `{"event": ..., "data": ...}`
//! message to all live connections. Delivery is at-most-once: a
//! connection that is closed or cannot take the message right now is
//! dropped from the registry and the client is expected to re-fetch
//! after reconnecting.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::registry::ConnectionRegistry;
use crate::models::{EventWithOrganizer, RsvpWithRelations};

/// Names of the notifications pushed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastEvent {
    EventCreated,
    EventUpdated,
    EventDeleted,
    RsvpUpdated,
}

impl BroadcastEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastEvent::EventCreated => "event_created",
            BroadcastEvent::EventUpdated => "event_updated",
            BroadcastEvent::EventDeleted => "event_deleted",
            BroadcastEvent::RsvpUpdated => "rsvp_updated",
        }
    }
}

impl std::fmt::Display for BroadcastEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire shape of a pushed message. Field order is part of the contract.
#[derive(Serialize)]
struct OutboundMessage<'a, T: Serialize> {
    event: &'a str,
    data: &'a T,
}

/// Payload of `event_deleted`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEvent {
    pub event_id: Uuid,
}

/// Dispatcher pushing notifications to every registered connection.
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher delivers to
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Number of currently registered connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Push `payload` under `event` to every open connection.
    ///
    /// Fire-and-forget: this never fails and never waits for delivery.
    /// The payload is serialized once; connections that are closed or
    /// refuse the message are unregistered and the rest still receive it.
    pub fn broadcast<T: Serialize>(&self, event: BroadcastEvent, payload: &T) {
        let outbound = OutboundMessage {
            event: event.as_str(),
            data: payload,
        };
        let message: Arc<str> = match serde_json::to_string(&outbound) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                error!(event = %event, error = %e, "Failed to serialize broadcast payload");
                return;
            }
        };

        let mut sent = 0usize;
        let mut pruned = 0usize;

        for conn in self.registry.snapshot() {
            if !conn.is_open() {
                self.registry.unregister(conn.id());
                pruned += 1;
                continue;
            }

            match conn.try_send(message.clone()) {
                Ok(()) => sent += 1,
                Err(e) => {
                    debug!(connection = %conn.id(), error = %e, "Dropping realtime connection");
                    self.registry.unregister(conn.id());
                    pruned += 1;
                }
            }
        }

        info!(event = %event, sent, pruned, "Broadcasted to clients");
    }

    pub fn event_created(&self, event: &EventWithOrganizer) {
        self.broadcast(BroadcastEvent::EventCreated, event);
    }

    pub fn event_updated(&self, event: &EventWithOrganizer) {
        self.broadcast(BroadcastEvent::EventUpdated, event);
    }

    pub fn event_deleted(&self, event_id: Uuid) {
        self.broadcast(BroadcastEvent::EventDeleted, &DeletedEvent { event_id });
    }

    pub fn rsvp_updated(&self, rsvp: &RsvpWithRelations) {
        self.broadcast(BroadcastEvent::RsvpUpdated, rsvp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::connection::{ChannelConnection, Connection, ConnectionId, SendError};
    use serde::ser::SerializeMap;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Connection recording what it receives; can be closed or made to fail
    struct TestConnection {
        id: ConnectionId,
        open: AtomicBool,
        fail_sends: bool,
        received: Mutex<Vec<String>>,
    }

    impl TestConnection {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: ConnectionId::new(),
                open: AtomicBool::new(true),
                fail_sends: false,
                received: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                id: ConnectionId::new(),
                open: AtomicBool::new(true),
                fail_sends: true,
                received: Mutex::new(Vec::new()),
            })
        }

        fn close(&self) {
            self.open.store(false, Ordering::SeqCst);
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    impl Connection for TestConnection {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }

        fn try_send(&self, message: Arc<str>) -> Result<(), SendError> {
            if self.fail_sends {
                return Err(SendError::Closed);
            }
            self.received.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    /// Payload that counts how often it gets serialized
    struct CountingPayload {
        serializations: Arc<AtomicUsize>,
    }

    impl Serialize for CountingPayload {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.serializations.fetch_add(1, Ordering::SeqCst);
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("id", "e1")?;
            map.end()
        }
    }

    fn broadcaster_with(conns: &[Arc<TestConnection>]) -> Broadcaster {
        let broadcaster = Broadcaster::new(Arc::new(ConnectionRegistry::new()));
        for conn in conns {
            broadcaster.registry().register(conn.clone());
        }
        broadcaster
    }

    #[test]
    fn test_broadcast_to_empty_registry_is_noop() {
        let broadcaster = Broadcaster::default();
        broadcaster.broadcast(BroadcastEvent::EventCreated, &json!({"id": "e1"}));
        assert_eq!(broadcaster.connection_count(), 0);
    }

    #[test]
    fn test_message_shape_is_delivered_verbatim() {
        let a = TestConnection::new();
        let b = TestConnection::new();
        let broadcaster = broadcaster_with(&[a.clone(), b.clone()]);

        broadcaster.broadcast(BroadcastEvent::EventCreated, &json!({"id": "e1"}));

        let expected = r#"{"event":"event_created","data":{"id":"e1"}}"#;
        assert_eq!(a.received(), vec![expected.to_string()]);
        assert_eq!(b.received(), vec![expected.to_string()]);
    }

    #[test]
    fn test_failed_sends_are_pruned_without_affecting_others() {
        let healthy: Vec<_> = (0..3).map(|_| TestConnection::new()).collect();
        let failing: Vec<_> = (0..2).map(|_| TestConnection::failing()).collect();
        let all: Vec<_> = healthy.iter().chain(failing.iter()).cloned().collect();
        let broadcaster = broadcaster_with(&all);
        assert_eq!(broadcaster.connection_count(), 5);

        broadcaster.broadcast(BroadcastEvent::EventUpdated, &json!({"id": "e1"}));

        assert_eq!(broadcaster.connection_count(), 3);
        for conn in &healthy {
            assert_eq!(conn.received().len(), 1);
            assert!(broadcaster.registry().contains(conn.id()));
        }
        for conn in &failing {
            assert!(!broadcaster.registry().contains(conn.id()));
        }
    }

    #[test]
    fn test_payload_serialized_once_per_broadcast() {
        let conns: Vec<_> = (0..10).map(|_| TestConnection::new()).collect();
        let broadcaster = broadcaster_with(&conns);
        let serializations = Arc::new(AtomicUsize::new(0));
        let payload = CountingPayload {
            serializations: serializations.clone(),
        };

        broadcaster.broadcast(BroadcastEvent::EventCreated, &payload);
        assert_eq!(serializations.load(Ordering::SeqCst), 1);

        broadcaster.broadcast(BroadcastEvent::EventUpdated, &payload);
        assert_eq!(serializations.load(Ordering::SeqCst), 2);

        for conn in &conns {
            assert_eq!(conn.received().len(), 2);
        }
    }

    #[test]
    fn test_closed_connection_is_skipped_and_pruned() {
        let a = TestConnection::new();
        let b = TestConnection::new();
        let c = TestConnection::new();
        let broadcaster = broadcaster_with(&[a.clone(), b.clone(), c.clone()]);

        // Closed out of band, never unregistered.
        b.close();
        broadcaster.broadcast(BroadcastEvent::EventDeleted, &json!({"eventId": "e1"}));

        let expected = r#"{"event":"event_deleted","data":{"eventId":"e1"}}"#;
        assert_eq!(a.received(), vec![expected.to_string()]);
        assert_eq!(c.received(), vec![expected.to_string()]);
        assert!(b.received().is_empty());
        assert!(!broadcaster.registry().contains(b.id()));
        assert_eq!(broadcaster.connection_count(), 2);
    }

    #[test]
    fn test_sequential_broadcasts_arrive_in_order() {
        let a = TestConnection::new();
        let broadcaster = broadcaster_with(&[a.clone()]);

        broadcaster.broadcast(BroadcastEvent::EventCreated, &json!({"id": "e1"}));
        broadcaster.broadcast(BroadcastEvent::EventUpdated, &json!({"id": "e1"}));

        let received = a.received();
        assert_eq!(received.len(), 2);
        assert!(received[0].starts_with(r#"{"event":"event_created""#));
        assert!(received[1].starts_with(r#"{"event":"event_updated""#));
    }

    #[tokio::test]
    async fn test_channel_connection_pruned_once_writer_is_gone() {
        let broadcaster = Broadcaster::default();
        let (live, mut live_rx) = ChannelConnection::new(8);
        let (gone, gone_rx) = ChannelConnection::new(8);
        broadcaster.registry().register(Arc::new(live));
        broadcaster.registry().register(Arc::new(gone));
        drop(gone_rx);

        broadcaster.event_deleted(Uuid::nil());

        assert_eq!(broadcaster.connection_count(), 1);
        let msg = live_rx.recv().await.unwrap();
        assert_eq!(
            &*msg,
            r#"{"event":"event_deleted","data":{"eventId":"00000000-0000-0000-0000-000000000000"}}"#
        );
    }

    #[test]
    fn test_full_buffer_counts_as_failure() {
        let broadcaster = Broadcaster::default();
        let (slow, _rx) = ChannelConnection::new(1);
        let slow_id = slow.id();
        broadcaster.registry().register(Arc::new(slow));

        broadcaster.broadcast(BroadcastEvent::RsvpUpdated, &json!({"n": 1}));
        assert!(broadcaster.registry().contains(slow_id));

        broadcaster.broadcast(BroadcastEvent::RsvpUpdated, &json!({"n": 2}));
        assert!(!broadcaster.registry().contains(slow_id));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(BroadcastEvent::EventCreated.as_str(), "event_created");
        assert_eq!(BroadcastEvent::EventUpdated.as_str(), "event_updated");
        assert_eq!(BroadcastEvent::EventDeleted.as_str(), "event_deleted");
        assert_eq!(BroadcastEvent::RsvpUpdated.as_str(), "rsvp_updated");
    }
}
