//! League-level endpoints: opening a market session and reading the
//! room roster/budget overview.

use crate::api::routes::{authenticate, engine_error, internal_error, ApiError, ErrorResponse};
use crate::api::server::AppState;
use crate::types::{AuctionMode, MemberView, Role, RoleSlot, SessionSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct OpenMarketRequest {
    /// "FirstMarket", "Rubata" or "Svincolati"
    pub mode: String,
    /// Explicit admin-set nomination order; shuffled once if omitted.
    pub turn_order: Option<Vec<i64>>,
}

/// Open a market session for the league (admin only).
pub async fn open_market(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<OpenMarketRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;

    let mode = AuctionMode::parse(&req.mode).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Mode must be 'FirstMarket', 'Rubata' or 'Svincolati'".to_string(),
                code: "bad_request".to_string(),
            }),
        )
    })?;

    let snapshot = state
        .engine
        .open_market(league_id, mode, req.turn_order, &member)
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

/// Latest market session of the league, as a per-viewer snapshot.
pub async fn league_session(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let member = authenticate(&state, auth.token()).await?;

    let session = state
        .db
        .find_league_session(league_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "No market session for this league".to_string(),
                    code: "session_not_found".to_string(),
                }),
            )
        })?;

    let snapshot = state
        .engine
        .snapshot(session.id, Some(member.id))
        .await
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Serialize)]
pub struct MemberOverview {
    #[serde(flatten)]
    pub member: MemberView,
    pub budget: i64,
    pub is_connected: bool,
    pub slots: Vec<SlotOverview>,
}

#[derive(Debug, Serialize)]
pub struct SlotOverview {
    pub role: Role,
    #[serde(flatten)]
    pub slot: RoleSlot,
}

/// Budgets and roster fill per member, for the room side panel.
pub async fn league_members(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<MemberOverview>>, ApiError> {
    let _member = authenticate(&state, auth.token()).await?;

    let league = state
        .db
        .get_league(league_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "League not found".to_string(),
                    code: "league_not_found".to_string(),
                }),
            )
        })?;

    let members = state
        .db
        .league_members(league_id)
        .await
        .map_err(internal_error)?;

    let mut overview = Vec::with_capacity(members.len());
    for member in &members {
        let mut slots = Vec::with_capacity(Role::SEQUENCE.len());
        for role in Role::SEQUENCE {
            let finance = state
                .db
                .member_finance(league_id, member.id, role, league.slots_for(role))
                .await
                .map_err(internal_error)?;
            slots.push(SlotOverview {
                role,
                slot: finance.slot,
            });
        }
        overview.push(MemberOverview {
            member: MemberView::from(member),
            budget: member.budget,
            is_connected: member.is_connected,
            slots,
        });
    }

    Ok(Json(overview))
}
