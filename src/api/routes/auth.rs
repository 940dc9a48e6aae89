//! Login/logout endpoints backed by database bearer sessions

use crate::api::routes::{internal_error, unauthorized, ApiError};
use crate::api::server::AppState;
use crate::auth::verify_password;
use crate::types::MemberView;
use axum::{extract::State, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub member: MemberView,
    pub league_id: i64,
    pub is_admin: bool,
}

/// Authenticate a member and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (member, password_hash) = state
        .db
        .get_member_by_username(&req.username)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| unauthorized("Unknown username or wrong password"))?;

    if !verify_password(&req.password, &password_hash) {
        return Err(unauthorized("Unknown username or wrong password"));
    }

    let session = state
        .db
        .create_auth_session(member.id)
        .await
        .map_err(internal_error)?;

    state
        .db
        .set_member_connected(member.id, true)
        .await
        .map_err(internal_error)?;

    info!("Member {} logged in", member.username);

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        member: MemberView::from(&member),
        league_id: member.league_id,
        is_admin: member.is_admin,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Invalidate the caller's bearer token.
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<LogoutResponse>, ApiError> {
    if let Some(session) = state
        .db
        .get_auth_session(auth.token())
        .await
        .map_err(internal_error)?
    {
        state
            .db
            .set_member_connected(session.member_id, false)
            .await
            .map_err(internal_error)?;
    }

    state
        .db
        .delete_auth_session(auth.token())
        .await
        .map_err(internal_error)?;

    Ok(Json(LogoutResponse { success: true }))
}
