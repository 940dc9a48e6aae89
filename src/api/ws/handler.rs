//! WebSocket connection handler
//!
//! Clients connect with `/ws?session_id=N` and receive the current
//! snapshot immediately, then every committed transition of that
//! session. The stream is a pure reflection of server state; clients
//! never decide anything from their own countdowns.

use crate::api::server::AppState;
use crate::notifier::WsEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info};

/// WebSocket message from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsClientMessage {
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "subscribe")]
    Subscribe,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: i64,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.session_id))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, session_id: i64) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected to session {}", session_id);

    // Send connected message
    let connected_msg = WsEvent::Connected {
        message: format!("Connected to auction room {session_id}"),
    };
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = sender.send(Message::Text(json)).await;
    }

    // Send the current snapshot immediately
    match state.engine.snapshot(session_id, None).await {
        Ok(snapshot) => {
            let msg = WsEvent::Session(Box::new(snapshot));
            if let Ok(json) = serde_json::to_string(&msg) {
                let _ = sender.send(Message::Text(json)).await;
            }
        }
        Err(e) => {
            debug!("No snapshot for session {}: {}", session_id, e);
        }
    }

    // Subscribe to session updates
    let mut event_rx = state.notifier.subscribe(session_id).await;

    // Spawn task to forward session updates to this client
    let send_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("WebSocket send failed, client disconnected");
                            break;
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    debug!("WebSocket client lagged {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Ok(msg) = serde_json::from_str::<WsClientMessage>(&text) {
                        match msg {
                            WsClientMessage::Ping => {
                                debug!("Received ping");
                            }
                            WsClientMessage::Subscribe => {
                                debug!("Received subscribe");
                                // Already subscribed on connect
                            }
                        }
                    }
                }
                Ok(Message::Ping(_)) => {
                    // Pong is sent automatically by axum
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client sent close");
                    break;
                }
                Err(e) => {
                    error!("WebSocket receive error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    info!("WebSocket client disconnected from session {}", session_id);
}
