//! Web API module for the auction server
//!
//! Provides the REST action surface consumed by the auction-room client
//! plus per-session WebSocket fan-out.

pub mod routes;
pub mod server;
pub mod ws;

pub use server::{create_app, AppState};
