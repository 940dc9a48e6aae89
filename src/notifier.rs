//! Notification fan-out for auction-room state.
//!
//! Every committed transition is broadcast to the session's subscribers
//! over an in-process channel that the WebSocket handlers drain.
//! Delivery is best-effort and strictly after commit: a failed or
//! listener-less broadcast is logged and forgotten, never retried on the
//! critical path and never able to roll back state.

use crate::types::{MemberView, PlayerView, SessionSnapshot};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// Message pushed to auction-room WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    #[serde(rename = "connected")]
    Connected { message: String },
    /// Full session snapshot; clients re-render from it wholesale.
    #[serde(rename = "session")]
    Session(Box<SessionSnapshot>),
    #[serde(rename = "pong")]
    Pong,
}

/// Per-session broadcast channels plus an optional outbound webhook for
/// auction results.
pub struct Notifier {
    channels: RwLock<HashMap<i64, broadcast::Sender<WsEvent>>>,
    webhook: Option<ResultWebhook>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Notifier {
            channels: RwLock::new(HashMap::new()),
            webhook: webhook_url.map(ResultWebhook::new),
        }
    }

    /// Subscribe to a session's event stream, creating the channel on
    /// first use.
    pub async fn subscribe(&self, session_id: i64) -> broadcast::Receiver<WsEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe()
    }

    /// Push an event to every subscriber of a session.
    pub async fn broadcast(&self, session_id: i64, event: WsEvent) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&session_id) {
            if sender.send(event).is_err() {
                debug!("No listeners for session {}", session_id);
            }
        }
    }

    /// Fire-and-forget result announcement to the configured webhook.
    pub fn announce_result(
        &self,
        player: PlayerView,
        winner: Option<MemberView>,
        final_price: i64,
    ) {
        if let Some(webhook) = &self.webhook {
            let webhook = webhook.clone();
            tokio::spawn(async move {
                webhook.send_result(&player, winner.as_ref(), final_price).await;
            });
        }
    }
}

/// Discord-style webhook client for auction results.
#[derive(Clone)]
struct ResultWebhook {
    client: Client,
    webhook_url: String,
}

impl ResultWebhook {
    fn new(webhook_url: String) -> Self {
        ResultWebhook {
            client: Client::new(),
            webhook_url,
        }
    }

    async fn send_result(&self, player: &PlayerView, winner: Option<&MemberView>, price: i64) {
        let (title, description, color) = match winner {
            Some(w) => (
                "Player sold".to_string(),
                format!(
                    "**{}** ({}, {}) goes to **{}** for **{}** credits",
                    player.name, player.role, player.team, w.team_name, price
                ),
                0x00FF00,
            ),
            None => (
                "Player unsold".to_string(),
                format!(
                    "**{}** ({}, {}) received no bids and returns to the pool",
                    player.name, player.role, player.team
                ),
                0xAAAAAA,
            ),
        };

        let embed = json!({
            "embeds": [{
                "title": title,
                "description": description,
                "color": color,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }]
        });

        match self.client.post(&self.webhook_url).json(&embed).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Result webhook sent for {}", player.name);
                } else {
                    error!("Result webhook failed: {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to send result webhook: {}", e);
            }
        }
    }
}
