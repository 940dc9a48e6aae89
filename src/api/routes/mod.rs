//! API route handlers

pub mod auction;
pub mod auth;
pub mod league;

use crate::api::server::AppState;
use crate::engine::{AuctionError, ErrorClass};
use crate::types::Member;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn internal_error(detail: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {detail}"),
            code: "internal".to_string(),
        }),
    )
}

pub(crate) fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "unauthorized".to_string(),
        }),
    )
}

/// Map an engine error onto the HTTP surface: validation 422,
/// authorization 403, state conflict 409, missing session 404, fatal
/// 500. Errors are returned to the acting client only; they never reach
/// the broadcast channel.
pub(crate) fn engine_error(err: AuctionError) -> ApiError {
    let status = match err.class() {
        ErrorClass::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorClass::Authorization => StatusCode::FORBIDDEN,
        ErrorClass::StateConflict => StatusCode::CONFLICT,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

/// Resolve a bearer token to the acting member.
pub(crate) async fn authenticate(state: &AppState, token: &str) -> Result<Member, ApiError> {
    let session = state
        .db
        .get_auth_session(token)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| unauthorized("Invalid or expired session"))?;

    state
        .db
        .get_member(session.member_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| unauthorized("Member no longer exists"))
}
