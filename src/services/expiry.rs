//! Expiry watcher - drives timer-based auction resolution
//!
//! Polls sessions that are currently bidding and asks the engine to
//! resolve any whose window has passed. The engine re-checks the timer
//! under the per-session lock, so a bid racing this watcher is either
//! ordered before the resolution or rejected with a timer error; the
//! watcher itself holds no authority over expiry.

use crate::db::Database;
use crate::engine::AuctionEngine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ExpiryWatcher {
    db: Arc<Database>,
    engine: Arc<AuctionEngine>,
}

impl ExpiryWatcher {
    pub fn new(db: Arc<Database>, engine: Arc<AuctionEngine>) -> Self {
        Self { db, engine }
    }

    /// Run the watcher loop.
    pub async fn run(&self, poll_interval: Duration) {
        info!("Expiry watcher started ({}ms poll)", poll_interval.as_millis());

        loop {
            match self.db.sessions_in_bidding().await {
                Ok(session_ids) => {
                    for session_id in session_ids {
                        match self.engine.check_expiry(session_id).await {
                            Ok(true) => {
                                info!("Session {}: auction resolved on timer expiry", session_id);
                            }
                            Ok(false) => {}
                            Err(e) => {
                                warn!("Expiry check failed for session {}: {}", session_id, e);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to list bidding sessions: {}", e);
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
