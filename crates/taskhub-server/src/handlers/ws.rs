//! WebSocket handler for real-time task change events
//!
//! Every connected client receives every event; there is no per-client
//! subscription state and no replay for clients that reconnect.

use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{sink::SinkExt, stream::StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use taskhub_types::{ClientMessage, ServerMessage};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fan-out hub for connected WebSocket clients
#[derive(Clone)]
pub struct EventHub {
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<ServerMessage>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a client connection for broadcasts
    pub async fn register(&self, connection_id: &str, tx: mpsc::UnboundedSender<ServerMessage>) {
        let mut conns = self.connections.write().await;
        conns.insert(connection_id.to_string(), tx);
        info!("Client registered for broadcasts: {}", connection_id);
    }

    /// Unregister a client connection
    pub async fn unregister(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        conns.remove(connection_id);
        info!("Client unregistered: {}", connection_id);
    }

    /// Broadcast a message to every connected client, best-effort.
    /// A client whose receiving half is gone is skipped, not an error.
    pub async fn broadcast(&self, msg: ServerMessage) {
        let conns = self.connections.read().await;
        for (connection_id, tx) in conns.iter() {
            if tx.send(msg.clone()).is_err() {
                debug!("Failed to send to client {}", connection_id);
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle WebSocket upgrade
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Channel feeding this client's outbound half
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Spawn task to forward messages from the channel to the WebSocket
    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    state.hub.register(&connection_id, tx.clone()).await;

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Message { data }) => {
                        info!("Message from client {}: {}", connection_id, data);
                        let _ = tx.send(ServerMessage::Response {
                            message: "Message received".to_string(),
                        });
                    }
                    Err(e) => {
                        warn!("Failed to parse message: {}", e);
                        let _ = tx.send(ServerMessage::Error {
                            code: "invalid_message".to_string(),
                            message: format!("Failed to parse message: {}", e),
                        });
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client closed connection: {}", connection_id);
                break;
            }
            Ok(_) => {
                // Binary frames are ignored; axum answers pings itself
            }
            Err(e) => {
                warn!("WebSocket error on {}: {}", connection_id, e);
                break;
            }
        }
    }

    state.hub.unregister(&connection_id).await;
    forward_task.abort();
    info!("Client disconnected: {}", connection_id);
}
