//! Axum server setup and configuration

use crate::api::routes;
use crate::api::ws::ws_handler;
use crate::engine::AuctionEngine;
use crate::notifier::Notifier;
use crate::{Config, Database};
use anyhow::Result;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub engine: Arc<AuctionEngine>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config.database_path).await?);
        let notifier = Arc::new(Notifier::new(config.webhook_url.clone()));
        let engine = Arc::new(AuctionEngine::new(
            db.clone(),
            notifier.clone(),
            config.auction_timer_seconds,
        ));

        Ok(Self {
            db,
            config: Arc::new(config),
            engine,
            notifier,
        })
    }
}

/// Create the Axum application with all routes
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // API routes
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        // League routes
        .route("/league/:id/market/open", post(routes::league::open_market))
        .route("/league/:id/session", get(routes::league::league_session))
        .route("/league/:id/members", get(routes::league::league_members))
        // Auction-room actions
        .route("/session/:id/state", get(routes::auction::session_state))
        .route("/session/:id/nominate", post(routes::auction::nominate))
        .route("/session/:id/confirm", post(routes::auction::confirm_nomination))
        .route("/session/:id/cancel", post(routes::auction::cancel_nomination))
        .route("/session/:id/ready", post(routes::auction::mark_ready))
        .route("/session/:id/bid", post(routes::auction::place_bid))
        .route("/session/:id/ack", post(routes::auction::acknowledge))
        .route("/session/:id/pass", post(routes::auction::pass_turn))
        // Admin overrides (audit-logged)
        .route(
            "/session/:id/admin/force-ready",
            post(routes::auction::force_all_ready),
        )
        .route(
            "/session/:id/admin/force-ack",
            post(routes::auction::force_acknowledge_all),
        )
        .route("/session/:id/admin/close", post(routes::auction::close_auction))
        .route(
            "/session/:id/admin/remove-member",
            post(routes::auction::remove_member),
        )
        .route("/session/:id/admin/repair", post(routes::auction::repair_session));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
