//! Realtime updates WebSocket handler
//!
//! Clients connect without authentication and receive every broadcast until
//! they disconnect. Inbound frames other than close are ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use super::WS_BUFFER_SIZE;
use crate::api::server::AppState;
use crate::realtime::{ChannelConnection, Connection};

/// WebSocket handler for realtime updates
pub async fn updates_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_updates_ws(socket, state))
}

/// Handle one subscriber from registration to removal
async fn handle_updates_ws(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (conn, mut rx) = ChannelConnection::new(WS_BUFFER_SIZE);
    let id = conn.id();

    let registry = state.broadcaster.registry().clone();
    registry.register(Arc::new(conn));

    info!(connection_id = %id, total = registry.len(), "Client connected");

    // Forward queued broadcasts to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.to_string())).await.is_err() {
                return;
            }
        }
        // Queue closed: the broadcaster pruned this connection
        let _ = sender.send(Message::Close(None)).await;
    });

    // Watch for close
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    debug!(connection_id = %id, "WebSocket received close");
                    break;
                }
                Err(e) => {
                    debug!(connection_id = %id, "WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut receive_task => {}
    }

    send_task.abort();
    receive_task.abort();
    let _ = tokio::join!(send_task, receive_task);

    registry.unregister(id);

    info!(connection_id = %id, total = registry.len(), "Client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::StreamExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;
    use uuid::Uuid;

    use crate::api::server::build_router;
    use crate::api::server::test_support::test_state;
    use crate::realtime::Broadcaster;

    /// Serve the full router on an ephemeral port and return the socket URL
    async fn serve(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("ws://{}/ws", addr)
    }

    async fn wait_for_connections(broadcaster: &Broadcaster, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while broadcaster.connection_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} connections, found {}",
                expected,
                broadcaster.connection_count()
            )
        });
    }

    #[tokio::test]
    async fn test_socket_lifecycle() {
        let state = test_state();
        let broadcaster = state.broadcaster.clone();
        let url = serve(state).await;
        assert_eq!(broadcaster.connection_count(), 0);

        let (mut ws, _) = connect_async(url).await.unwrap();
        wait_for_connections(&broadcaster, 1).await;

        let event_id = Uuid::new_v4();
        broadcaster.event_deleted(event_id);

        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let expected = format!(
            r#"{{"event":"event_deleted","data":{{"eventId":"{}"}}}}"#,
            event_id
        );
        assert_eq!(frame, ClientMessage::Text(expected));

        ws.close(None).await.unwrap();
        wait_for_connections(&broadcaster, 0).await;
    }

    #[tokio::test]
    async fn test_each_socket_is_registered_separately() {
        let state = test_state();
        let broadcaster = state.broadcaster.clone();
        let url = serve(state).await;

        let (mut first, _) = connect_async(url.clone()).await.unwrap();
        let (mut second, _) = connect_async(url).await.unwrap();
        wait_for_connections(&broadcaster, 2).await;

        first.close(None).await.unwrap();
        wait_for_connections(&broadcaster, 1).await;

        let event_id = Uuid::new_v4();
        broadcaster.event_deleted(event_id);

        let frame = tokio::time::timeout(Duration::from_secs(5), second.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(frame.into_text().unwrap().contains(&event_id.to_string()));
    }

    #[tokio::test]
    async fn test_pruned_connection_closes_socket() {
        let state = test_state();
        let broadcaster = state.broadcaster.clone();
        let url = serve(state).await;

        let (mut ws, _) = connect_async(url).await.unwrap();
        wait_for_connections(&broadcaster, 1).await;

        // Same removal the broadcaster performs for a full or closed queue
        let id = broadcaster.registry().snapshot()[0].id();
        assert!(broadcaster.registry().unregister(id));

        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap();
        assert!(matches!(next, Some(Ok(ClientMessage::Close(_)))));
        assert_eq!(broadcaster.connection_count(), 0);
    }
}
