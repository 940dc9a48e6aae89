//! Auction-room core: timer authority, turn sequencer, session record
//! and the state-machine engine that drives them.
//!
//! The pure transition logic lives in [`auction`]; this module wraps it
//! with the runtime concerns: per-session mutual exclusion, load/save
//! through the session store, transactional application of resolution
//! side effects and post-commit broadcast. All mutations to one session
//! are serialized behind an in-process async mutex keyed by session id,
//! so concurrent bids are strictly ordered and a late bid can never race
//! the expiry resolution.

pub mod auction;
pub mod errors;
pub mod session;
pub mod timer;
pub mod turn;

pub use auction::{AckProgress, AuctionOutcome, PassOutcome, Winner};
pub use errors::{AuctionError, ErrorClass};
pub use session::MarketSession;

use crate::db::Database;
use crate::notifier::{Notifier, WsEvent};
use crate::types::{
    AckStatus, AuctionMode, AuctionView, Bidder, Member, MemberView, PlayerView, SessionSnapshot,
    SessionState,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// One async mutex per session id. Guards every mutating operation so
/// read-modify-write races on the session record cannot interleave.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn get(&self, session_id: i64) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(session_id).or_default().clone()
    }
}

/// The auction-room engine. One instance serves every session; state
/// lives in the session store, not here.
pub struct AuctionEngine {
    db: Arc<Database>,
    notifier: Arc<Notifier>,
    locks: SessionLocks,
    default_timer_seconds: i64,
}

impl AuctionEngine {
    pub fn new(db: Arc<Database>, notifier: Arc<Notifier>, default_timer_seconds: i64) -> Self {
        AuctionEngine {
            db,
            notifier,
            locks: SessionLocks::default(),
            default_timer_seconds,
        }
    }

    // ==================== SESSION LIFECYCLE ====================

    /// Open a market session for a league (admin only). The nomination
    /// order is shuffled once unless an explicit order is given, and the
    /// league phase moves to the mode's phase.
    pub async fn open_market(
        &self,
        league_id: i64,
        mode: AuctionMode,
        explicit_order: Option<Vec<i64>>,
        actor: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(actor)?;
        if actor.league_id != league_id {
            return Err(AuctionError::Forbidden);
        }
        let league = self
            .db
            .get_league(league_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or(AuctionError::SessionNotFound)?;

        let members = self
            .db
            .league_members(league_id)
            .await
            .map_err(AuctionError::from)?;
        let order = match explicit_order {
            Some(order) => order,
            None => turn::initial_order(members.iter().map(|m| m.id).collect(), true),
        };
        if order.is_empty() {
            return Err(AuctionError::EmptyTurnOrder);
        }

        let mut session = MarketSession::open(
            0,
            league_id,
            mode,
            order,
            self.default_timer_seconds,
        );
        session.id = self
            .db
            .create_market_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.db
            .set_league_phase(league_id, mode.league_phase())
            .await
            .map_err(AuctionError::from)?;
        self.db
            .record_audit(
                league_id,
                Some(actor.id),
                "market_opened",
                &format!("session {} opened in {} mode", session.id, mode),
            )
            .await
            .map_err(AuctionError::from)?;

        info!(
            "League {} ({}): market session {} opened in {} mode",
            league_id, league.name, session.id, mode
        );
        self.build_snapshot(&session, None).await
    }

    /// Read-only per-viewer snapshot.
    pub async fn snapshot(
        &self,
        session_id: i64,
        viewer: Option<i64>,
    ) -> Result<SessionSnapshot, AuctionError> {
        let session = self.load(session_id).await?;
        self.build_snapshot(&session, viewer).await
    }

    // ==================== MEMBER ACTIONS ====================

    /// Nominate a player for auction.
    pub async fn nominate(
        &self,
        session_id: i64,
        member: &Member,
        player_id: i64,
        opening_offer: Option<i64>,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;

        let status = self
            .db
            .player_status(session.league_id, player_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or(AuctionError::PlayerUnavailable)?;
        let finance = self
            .member_finance(&session, member.id, status.player.role)
            .await?;

        session.nominate(member.id, &status, opening_offer, &finance)?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    /// Nominator locks the nomination in and opens the ready check.
    pub async fn confirm_nomination(
        &self,
        session_id: i64,
        member: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;
        session.confirm_nomination(member.id)?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    /// Nominator aborts an unconfirmed nomination.
    pub async fn cancel_nomination(
        &self,
        session_id: i64,
        member: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;
        session.cancel_nomination(member.id)?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    /// Member confirms readiness for the pending nomination. Bidding
    /// starts automatically once everyone has confirmed.
    pub async fn mark_ready(
        &self,
        session_id: i64,
        member: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;

        let (player, nominator) = self.nomination_context(&session).await?;
        let started = session.mark_ready(member.id, &player, &nominator, Utc::now())?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        if started {
            info!(
                "Session {}: all ready, bidding open on {} (base {})",
                session.id, player.name, player.quotation
            );
        }
        self.publish(&session).await
    }

    /// Place a bid on the live auction.
    pub async fn place_bid(
        &self,
        session_id: i64,
        member: &Member,
        amount: i64,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;

        let player_id = session
            .auction
            .as_ref()
            .map(|a| a.player_id)
            .ok_or(AuctionError::InvalidState { expected: "Bidding" })?;
        let player = self
            .db
            .get_player(player_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!("auctioned player {player_id} missing"),
            })?;
        let mut finance = self
            .member_finance(&session, member.id, player.role)
            .await?;
        if session.mode == AuctionMode::Rubata {
            // the defending owner's slot is occupied by the player on
            // the block; winning keeps the roster size unchanged
            let owner = self
                .db
                .player_status(session.league_id, player_id)
                .await
                .map_err(AuctionError::from)?
                .and_then(|s| s.owner);
            if owner == Some(member.id) {
                finance.slot.filled = finance.slot.filled.saturating_sub(1);
            }
        }

        let bidder = Bidder {
            member_id: member.id,
            username: member.username.clone(),
            team_name: member.team_name.clone(),
        };
        session.place_bid(&bidder, player.role, amount, &finance, Utc::now())?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    /// Member acknowledges the last resolution; the turn advances once
    /// everyone has.
    pub async fn acknowledge(
        &self,
        session_id: i64,
        member: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;

        let progress = session.acknowledge(member.id)?;
        if progress == AckProgress::Complete {
            self.after_round(&mut session).await?;
        }
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    /// Turn member declines to nominate (rubata/svincolati).
    pub async fn pass_turn(
        &self,
        session_id: i64,
        member: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, member)?;

        let outcome = session.pass_turn(member.id)?;
        if outcome == PassOutcome::RoundFinished {
            self.finish_market_round(&session).await?;
        }
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;

        self.publish(&session).await
    }

    // ==================== SYSTEM ACTIONS ====================

    /// Resolve the auction if its timer has expired. Called by the
    /// expiry watcher; shares the session lock with user actions, so a
    /// late bid and the resolution are mutually exclusive. Returns
    /// whether a resolution happened.
    pub async fn check_expiry(&self, session_id: i64) -> Result<bool, AuctionError> {
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        let outcome = match session.resolve_expired(Utc::now())? {
            Some(outcome) => outcome,
            None => return Ok(false),
        };

        self.commit_outcome(&session, &outcome).await?;
        self.publish(&session).await?;
        Ok(true)
    }

    // ==================== ADMIN OVERRIDES ====================

    /// Start bidding even though some members never confirmed ready.
    pub async fn force_all_ready(
        &self,
        session_id: i64,
        admin: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(admin)?;
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, admin)?;
        let (player, nominator) = self.nomination_context(&session).await?;
        session.force_all_ready(&player, &nominator, Utc::now())?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;
        self.audit(&session, admin, "force_all_ready", &player.name).await;

        self.publish(&session).await
    }

    /// Complete a stalled acknowledgment round on the members' behalf.
    pub async fn force_acknowledge_all(
        &self,
        session_id: i64,
        admin: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(admin)?;
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, admin)?;
        session.force_acknowledge_all()?;
        self.after_round(&mut session).await?;
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;
        self.audit(&session, admin, "force_acknowledge_all", "").await;

        self.publish(&session).await
    }

    /// Close the live auction immediately, with the same effect as a
    /// timer expiry.
    pub async fn close_auction(
        &self,
        session_id: i64,
        admin: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(admin)?;
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, admin)?;
        let outcome = session.close_auction()?;
        self.commit_outcome(&session, &outcome).await?;
        self.audit(
            &session,
            admin,
            "auction_closed",
            &format!("player {}", outcome.player_id),
        )
        .await;

        self.publish(&session).await
    }

    /// Remove a member who left the league from the session's turn
    /// order and transient sets.
    pub async fn remove_member(
        &self,
        session_id: i64,
        member_id: i64,
        admin: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(admin)?;
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        ensure_member_of(&session, admin)?;
        let was_acknowledging = session.state == SessionState::Acknowledgment;
        session.remove_member(member_id)?;
        if was_acknowledging && session.state == SessionState::Idle {
            self.after_round(&mut session).await?;
        }
        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;
        self.audit(
            &session,
            admin,
            "member_removed",
            &format!("member {member_id}"),
        )
        .await;

        self.publish(&session).await
    }

    /// Reset a frozen or corrupt session back to an idle state so play
    /// can resume. This is the manual repair path for fatal errors; it
    /// never runs automatically.
    pub async fn repair_session(
        &self,
        session_id: i64,
        admin: &Member,
    ) -> Result<SessionSnapshot, AuctionError> {
        ensure_admin(admin)?;
        let lock = self.locks.get(session_id).await;
        let _guard = lock.lock().await;

        // intentionally skip validation: repair must work on records the
        // loader would reject
        let mut session = self
            .db
            .load_session(session_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or(AuctionError::SessionNotFound)?;
        ensure_member_of(&session, admin)?;

        session.state = SessionState::Idle;
        session.nomination = None;
        session.auction = None;
        session.pending_ack = None;
        session.ready_members.clear();
        session.passed_members.clear();
        if session.turn_order.is_empty() {
            let members = self
                .db
                .league_members(session.league_id)
                .await
                .map_err(AuctionError::from)?;
            session.turn_order = turn::initial_order(members.iter().map(|m| m.id).collect(), true);
            if session.turn_order.is_empty() {
                return Err(AuctionError::EmptyTurnOrder);
            }
        }
        if session.current_turn_index >= session.turn_order.len() {
            session.current_turn_index = 0;
        }
        session.frozen = false;

        self.db
            .save_session(&session)
            .await
            .map_err(AuctionError::from)?;
        self.audit(&session, admin, "session_repaired", "").await;
        warn!("Session {} manually repaired by {}", session.id, admin.username);

        self.publish(&session).await
    }

    // ==================== INTERNALS ====================

    /// Load and validate a session. A failed validation is fatal: the
    /// session is frozen in place, logged with full state context and
    /// surfaced to the admin; it is never silently auto-corrected.
    async fn load(&self, session_id: i64) -> Result<MarketSession, AuctionError> {
        let session = self
            .db
            .load_session(session_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or(AuctionError::SessionNotFound)?;

        if session.frozen {
            // already quarantined; transitions reject with SessionFrozen
            return Ok(session);
        }
        if let Err(err) = session.validate() {
            error!(
                "Fatal inconsistency in session {}: {} (state: {:?})",
                session.id, err, session
            );
            let mut frozen = session;
            frozen.frozen = true;
            if let Err(save_err) = self.db.save_session(&frozen).await {
                error!("Failed to freeze corrupt session {}: {}", frozen.id, save_err);
            }
            return Err(err);
        }
        Ok(session)
    }

    async fn member_finance(
        &self,
        session: &MarketSession,
        member_id: i64,
        role: crate::types::Role,
    ) -> Result<crate::types::MemberFinance, AuctionError> {
        let league = self
            .db
            .get_league(session.league_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!("league {} missing", session.league_id),
            })?;
        self.db
            .member_finance(session.league_id, member_id, role, league.slots_for(role))
            .await
            .map_err(AuctionError::from)
    }

    /// Player and nominator identity for the pending nomination.
    async fn nomination_context(
        &self,
        session: &MarketSession,
    ) -> Result<(crate::types::Player, Bidder), AuctionError> {
        let nomination = session.nomination.as_ref().ok_or(AuctionError::InvalidState {
            expected: "ReadyCheck",
        })?;
        let player = self
            .db
            .get_player(nomination.player_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!("nominated player {} missing", nomination.player_id),
            })?;
        let nominator = self
            .db
            .get_member(nomination.nominator_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!("nominator {} missing", nomination.nominator_id),
            })?;
        let bidder = Bidder {
            member_id: nominator.id,
            username: nominator.username,
            team_name: nominator.team_name,
        };
        Ok((player, bidder))
    }

    /// Apply a resolution: one transaction for budget, roster and the
    /// session write, then a fire-and-forget result announcement.
    async fn commit_outcome(
        &self,
        session: &MarketSession,
        outcome: &AuctionOutcome,
    ) -> Result<(), AuctionError> {
        self.db
            .commit_resolution(session, outcome)
            .await
            .map_err(AuctionError::from)?;

        match &outcome.winner {
            Some(winner) => info!(
                "Session {}: player {} sold to member {} for {}",
                session.id, outcome.player_id, winner.member_id, winner.amount
            ),
            None => info!(
                "Session {}: player {} unsold, returned to pool",
                session.id, outcome.player_id
            ),
        }

        if let Ok(Some(player)) = self.db.get_player(outcome.player_id).await {
            let winner_view = match &outcome.winner {
                Some(w) => self
                    .db
                    .get_member(w.member_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|m| MemberView::from(&m)),
                None => None,
            };
            let price = outcome.winner.as_ref().map(|w| w.amount).unwrap_or(0);
            self.notifier
                .announce_result(PlayerView::from(&player), winner_view, price);
        }
        Ok(())
    }

    /// Post-round bookkeeping after an acknowledgment round completed:
    /// in the first market, advance the role sequence when the current
    /// role is filled league-wide, and exit the market phase after the
    /// last role.
    async fn after_round(&self, session: &mut MarketSession) -> Result<(), AuctionError> {
        if session.mode != AuctionMode::FirstMarket {
            return Ok(());
        }
        let league = self
            .db
            .get_league(session.league_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!("league {} missing", session.league_id),
            })?;

        while let Some(role) = session.current_role {
            let missing = self
                .db
                .members_missing_role_slots(league.id, role, league.slots_for(role))
                .await
                .map_err(AuctionError::from)?;
            if missing > 0 {
                break;
            }
            match session.advance_current_role() {
                Some(next) => {
                    info!(
                        "League {}: {} slots filled for every member, board moves to {}",
                        league.id, role, next
                    );
                }
                None => {
                    self.finish_market_round(session).await?;
                    break;
                }
            }
        }
        Ok(())
    }

    /// The session's market round is over; move the league to the next
    /// phase.
    async fn finish_market_round(&self, session: &MarketSession) -> Result<(), AuctionError> {
        let phase = session.mode.league_phase();
        if let Some(next) = phase.next() {
            self.db
                .set_league_phase(session.league_id, next)
                .await
                .map_err(AuctionError::from)?;
            self.db
                .record_audit(
                    session.league_id,
                    None,
                    "phase_advanced",
                    &format!("{} complete, league enters {}", phase, next),
                )
                .await
                .map_err(AuctionError::from)?;
            info!(
                "League {}: {} complete, entering {}",
                session.league_id, phase, next
            );
        }
        Ok(())
    }

    async fn audit(&self, session: &MarketSession, actor: &Member, action: &str, detail: &str) {
        if let Err(e) = self
            .db
            .record_audit(session.league_id, Some(actor.id), action, detail)
            .await
        {
            warn!("Failed to record audit entry {action}: {e}");
        }
    }

    /// Broadcast the committed state and return the snapshot. Broadcast
    /// failures are logged inside the notifier and never bubble up.
    async fn publish(&self, session: &MarketSession) -> Result<SessionSnapshot, AuctionError> {
        let snapshot = self.build_snapshot(session, None).await?;
        self.notifier
            .broadcast(session.id, WsEvent::Session(Box::new(snapshot.clone())))
            .await;
        Ok(snapshot)
    }

    /// Assemble the public DTO for a session. With a `viewer` the
    /// per-user flags (ready/acknowledged/nominator) are filled in.
    async fn build_snapshot(
        &self,
        session: &MarketSession,
        viewer: Option<i64>,
    ) -> Result<SessionSnapshot, AuctionError> {
        let members = self
            .db
            .league_members(session.league_id)
            .await
            .map_err(AuctionError::from)?;
        let by_id: HashMap<i64, &Member> = members.iter().map(|m| (m.id, m)).collect();
        let view = |id: i64| -> MemberView {
            by_id.get(&id).map(|m| MemberView::from(*m)).unwrap_or(MemberView {
                member_id: id,
                username: format!("member-{id}"),
                team_name: String::new(),
            })
        };

        let player_id = session
            .nomination
            .as_ref()
            .map(|n| n.player_id)
            .or_else(|| session.auction.as_ref().map(|a| a.player_id))
            .or_else(|| session.pending_ack.as_ref().map(|a| a.player_id));
        let player = match player_id {
            Some(id) => self.db.get_player(id).await.map_err(AuctionError::from)?,
            None => None,
        };
        let player_view = player.as_ref().map(PlayerView::from);

        let now = Utc::now();
        let auction = match (&session.auction, &player_view) {
            (Some(a), Some(pv)) => Some(AuctionView {
                player: pv.clone(),
                base_price: a.base_price,
                current_price: a.current_price,
                bids: a.bids.clone(),
                expires_at: a.expires_at,
                remaining_seconds: timer::remaining_seconds(a.expires_at, now),
            }),
            _ => None,
        };

        let ready = match (&session.nomination, &player_view) {
            (Some(n), Some(pv))
                if matches!(
                    session.state,
                    SessionState::NominationPending | SessionState::ReadyCheck
                ) =>
            {
                let awaited: Vec<i64> = session
                    .turn_order
                    .iter()
                    .copied()
                    .filter(|id| *id != n.nominator_id)
                    .collect();
                let ready_ids: Vec<i64> = awaited
                    .iter()
                    .copied()
                    .filter(|id| session.ready_members.contains(id))
                    .collect();
                let pending_ids: Vec<i64> = awaited
                    .iter()
                    .copied()
                    .filter(|id| !session.ready_members.contains(id))
                    .collect();
                Some(crate::types::ReadyStatus {
                    player: pv.clone(),
                    nominator_username: view(n.nominator_id).username,
                    nominator_confirmed: n.confirmed,
                    ready_members: ready_ids.iter().map(|id| view(*id)).collect(),
                    pending_members: pending_ids.iter().map(|id| view(*id)).collect(),
                    ready_count: ready_ids.len(),
                    total_members: awaited.len(),
                    user_is_nominator: viewer.map(|v| v == n.nominator_id),
                    user_is_ready: viewer.map(|v| session.ready_members.contains(&v)),
                })
            }
            _ => None,
        };

        let ack = match (&session.pending_ack, &player_view) {
            (Some(a), Some(pv)) => Some(AckStatus {
                player: pv.clone(),
                winner: a.winner_id.map(&view),
                final_price: a.final_price,
                acknowledged_members: a.acknowledged.iter().map(|id| view(*id)).collect(),
                pending_members: a.pending.iter().map(|id| view(*id)).collect(),
                total_members: a.total_members(),
                total_acknowledged: a.acknowledged.len(),
                user_acknowledged: viewer.map(|v| a.acknowledged.contains(&v)),
            }),
            _ => None,
        };

        let current_turn = view(session.current_turn_member()?);

        Ok(SessionSnapshot {
            session_id: session.id,
            league_id: session.league_id,
            mode: session.mode,
            state: session.state,
            current_role: session.current_role,
            turn_order: session.turn_order.iter().map(|id| view(*id)).collect(),
            current_turn,
            auction_timer_seconds: session.auction_timer_seconds,
            auction,
            ready,
            ack,
            passed_members: session.passed_members.iter().map(|id| view(*id)).collect(),
            frozen: session.frozen,
        })
    }
}

fn ensure_admin(member: &Member) -> Result<(), AuctionError> {
    if member.is_admin {
        Ok(())
    } else {
        Err(AuctionError::Forbidden)
    }
}

fn ensure_member_of(session: &MarketSession, member: &Member) -> Result<(), AuctionError> {
    if member.league_id == session.league_id {
        Ok(())
    } else {
        Err(AuctionError::Forbidden)
    }
}
