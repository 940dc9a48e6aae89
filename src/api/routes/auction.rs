//! Auction-room action endpoints
//!
//! Every action authenticates the caller, hands the request to the
//! engine and returns either the committed snapshot or a typed failure.
//! Validation and authorization failures are local to the caller; the
//! committed state reaches everyone else through the broadcast channel.

use crate::api::routes::{authenticate, engine_error, ApiError};
use crate::api::server::AppState;
use crate::types::SessionSnapshot;
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Deserialize;

/// Per-viewer session snapshot.
pub async fn session_state(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .snapshot(session_id, Some(member.id))
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct NominateRequest {
    pub player_id: i64,
    /// Rubata only: offer that puts an owned player on the block.
    pub opening_offer: Option<i64>,
}

pub async fn nominate(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<NominateRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .nominate(session_id, &member, req.player_id, req.opening_offer)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn confirm_nomination(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .confirm_nomination(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn cancel_nomination(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .cancel_nomination(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn mark_ready(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .mark_ready(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: i64,
}

pub async fn place_bid(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<BidRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .place_bid(session_id, &member, req.amount)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .acknowledge(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn pass_turn(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .pass_turn(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

// ==================== ADMIN OVERRIDES ====================

pub async fn force_all_ready(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .force_all_ready(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn force_acknowledge_all(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .force_acknowledge_all(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn close_auction(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .close_auction(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    pub member_id: i64,
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .remove_member(session_id, req.member_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

pub async fn repair_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;
    let snapshot = state
        .engine
        .repair_session(session_id, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}
