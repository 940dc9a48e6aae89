//! Fantasta web server
//!
//! Auction-room backend: REST action surface, per-session WebSocket
//! fan-out and the background timer-expiry watcher.

use anyhow::Result;
use fantasta::api::{create_app, AppState};
use fantasta::services::ExpiryWatcher;
use fantasta::Config;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; override with RUST_LOG for full debugging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       FANTASTA - AUCTION ROOM SERVER                          ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Auction timer: {:<44} ║", format!("{}s per bid window", config.auction_timer_seconds));
    println!("║  Result webhook: {:<43} ║", if config.webhook_url.is_some() { "ENABLED" } else { "DISABLED" });
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    // Create application state
    info!("Initializing application state...");
    let state = AppState::new(config.clone()).await?;

    // Spawn the timer-expiry watcher: server-side expiry is the single
    // authority over when a bidding window ends
    let watcher_db = state.db.clone();
    let watcher_engine = state.engine.clone();
    let poll = Duration::from_millis(config.expiry_poll_ms);
    tokio::spawn(async move {
        info!("Starting auction expiry watcher...");
        let watcher = ExpiryWatcher::new(watcher_db, watcher_engine);
        watcher.run(poll).await;
    });

    // Spawn periodic auth-session cleanup
    let cleanup_db = state.db.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            match cleanup_db.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => info!("Cleaned up {} expired auth sessions", n),
                Err(e) => tracing::warn!("Auth session cleanup failed: {}", e),
            }
        }
    });

    // Create the Axum app
    let port = state.config.bind_port;
    let app = create_app(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    println!();
    println!("  API:       http://localhost:{port}/api");
    println!("  WebSocket: ws://localhost:{port}/ws?session_id=<id>");
    println!("  Health:    http://localhost:{port}/health");
    println!();

    // Run the server
    axum::serve(listener, app).await?;

    Ok(())
}
