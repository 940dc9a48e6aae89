//! Configuration management for the auction server

use anyhow::Result;
use std::env;

/// Server configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database
    pub database_path: String,

    /// Port the web server binds to
    pub bind_port: u16,

    /// Bidding-window length for new market sessions, in seconds
    pub auction_timer_seconds: i64,

    /// How often the expiry watcher polls bidding sessions, in ms
    pub expiry_poll_ms: u64,

    /// Discord-style webhook URL for auction results (optional)
    pub webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "fantasta.db".to_string());

        let bind_port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let auction_timer_seconds = env::var("AUCTION_TIMER_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let expiry_poll_ms = env::var("EXPIRY_POLL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let webhook_url = env::var("RESULT_WEBHOOK_URL").ok().filter(|s| !s.is_empty());

        if auction_timer_seconds <= 0 {
            anyhow::bail!("AUCTION_TIMER_SECONDS must be positive");
        }
        if expiry_poll_ms == 0 {
            anyhow::bail!("EXPIRY_POLL_MS must be positive");
        }

        Ok(Self {
            database_path,
            bind_port,
            auction_timer_seconds,
            expiry_poll_ms,
            webhook_url,
        })
    }
}
