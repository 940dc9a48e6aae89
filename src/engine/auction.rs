//! Auction-room state machine transitions.
//!
//! All transitions here are pure: they mutate a [`MarketSession`] given
//! the caller's identity, the committed member/player context and an
//! explicit `now` instant, and return a typed error on rejection. The
//! async engine wraps them with per-session locking and transactional
//! persistence; nothing in this module touches the database.
//!
//! State flow:
//! `Idle -> NominationPending -> ReadyCheck -> Bidding -> Acknowledgment -> Idle`
//! with the resolution step folded into the `Bidding -> Acknowledgment`
//! edge (it happens atomically under the session lock). The same machine
//! serves the first market, the rubata and the svincolati rounds; the
//! mode only changes how a player enters the block and how a round ends.

use crate::engine::errors::AuctionError;
use crate::engine::session::MarketSession;
use crate::engine::{timer, turn};
use crate::types::{
    Auction, AuctionMode, Bid, Bidder, MemberFinance, PendingAck, PendingNomination, Player,
    PlayerStatus, Role, SessionState,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Result of an auction resolution, applied transactionally by the
/// engine (budget debit, roster move, owner credit for a steal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionOutcome {
    pub player_id: i64,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub member_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckProgress {
    Pending,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Continued,
    /// Every active member passed consecutively; the round is over.
    RoundFinished,
}

impl MarketSession {
    fn ensure_not_frozen(&self) -> Result<(), AuctionError> {
        if self.frozen {
            return Err(AuctionError::SessionFrozen);
        }
        Ok(())
    }

    /// Put a player on the block. Only the member whose turn it is may
    /// nominate, and only a player the mode's entry rule accepts.
    pub fn nominate(
        &mut self,
        member_id: i64,
        player: &PlayerStatus,
        opening_offer: Option<i64>,
        finance: &MemberFinance,
    ) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Idle {
            return Err(AuctionError::InvalidState { expected: "Idle" });
        }
        if member_id != self.current_turn_member()? {
            return Err(AuctionError::NotYourTurn);
        }

        let offer = match self.mode {
            AuctionMode::FirstMarket => {
                if player.owner.is_some() {
                    return Err(AuctionError::PlayerUnavailable);
                }
                // only the role currently on the board is nominable
                if self.current_role != Some(player.player.role) {
                    return Err(AuctionError::PlayerUnavailable);
                }
                None
            }
            AuctionMode::Svincolati => {
                if player.owner.is_some() {
                    return Err(AuctionError::PlayerUnavailable);
                }
                None
            }
            AuctionMode::Rubata => {
                match player.owner {
                    Some(owner) if owner != member_id => {}
                    _ => return Err(AuctionError::PlayerUnavailable),
                }
                let offer = opening_offer.ok_or(AuctionError::OfferTooLow {
                    minimum: player.player.quotation,
                })?;
                if offer < player.player.quotation {
                    return Err(AuctionError::OfferTooLow {
                        minimum: player.player.quotation,
                    });
                }
                if offer > finance.budget {
                    return Err(AuctionError::InsufficientBudget {
                        budget: finance.budget,
                    });
                }
                if finance.slot.is_full() {
                    return Err(AuctionError::RoleSlotFull {
                        role: player.player.role,
                    });
                }
                Some(offer)
            }
        };

        self.nomination = Some(PendingNomination {
            player_id: player.player.id,
            nominator_id: member_id,
            confirmed: false,
            opening_offer: offer,
        });
        // a successful nomination breaks any consecutive-pass streak
        self.passed_members.clear();
        self.state = SessionState::NominationPending;
        Ok(())
    }

    /// Nominator locks the nomination in and opens the ready check.
    pub fn confirm_nomination(&mut self, member_id: i64) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        let nomination = match self.state {
            SessionState::NominationPending => self.nomination.as_mut().ok_or_else(|| {
                AuctionError::Corrupt {
                    detail: "nomination pending without nomination".to_string(),
                }
            })?,
            _ => {
                return Err(AuctionError::InvalidState {
                    expected: "NominationPending",
                })
            }
        };
        if nomination.nominator_id != member_id {
            return Err(AuctionError::Forbidden);
        }
        nomination.confirmed = true;
        self.ready_members.clear();
        self.state = SessionState::ReadyCheck;
        Ok(())
    }

    /// Abort an unconfirmed nomination. Once confirmed there is no way
    /// back; the ready check runs to completion.
    pub fn cancel_nomination(&mut self, member_id: i64) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::NominationPending {
            return Err(AuctionError::InvalidState {
                expected: "NominationPending",
            });
        }
        let nominator = self
            .nomination
            .as_ref()
            .map(|n| n.nominator_id)
            .ok_or_else(|| AuctionError::Corrupt {
                detail: "nomination pending without nomination".to_string(),
            })?;
        if nominator != member_id {
            return Err(AuctionError::Forbidden);
        }
        self.nomination = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Non-nominator member confirms readiness. When every active
    /// non-nominator has confirmed, bidding starts with a full timer
    /// window. Returns `true` if this call started the bidding.
    pub fn mark_ready(
        &mut self,
        member_id: i64,
        player: &Player,
        nominator: &Bidder,
        now: DateTime<Utc>,
    ) -> Result<bool, AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::ReadyCheck {
            return Err(AuctionError::InvalidState {
                expected: "ReadyCheck",
            });
        }
        if !self.is_active_member(member_id) {
            return Err(AuctionError::Forbidden);
        }
        let nominator_id = self
            .nomination
            .as_ref()
            .map(|n| n.nominator_id)
            .unwrap_or_default();
        if member_id == nominator_id {
            // the nominator confirmed already; ready is for the others
            return Err(AuctionError::Forbidden);
        }

        self.ready_members.insert(member_id);

        let all_ready = self
            .turn_order
            .iter()
            .filter(|id| **id != nominator_id)
            .all(|id| self.ready_members.contains(id));
        if all_ready {
            self.start_bidding(player, nominator, now);
            return Ok(true);
        }
        Ok(false)
    }

    /// Admin override for a stuck ready check. Audit-logged by the
    /// engine; bidding starts immediately with a full window.
    pub fn force_all_ready(
        &mut self,
        player: &Player,
        nominator: &Bidder,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::ReadyCheck {
            return Err(AuctionError::InvalidState {
                expected: "ReadyCheck",
            });
        }
        self.start_bidding(player, nominator, now);
        Ok(())
    }

    fn start_bidding(&mut self, player: &Player, nominator: &Bidder, now: DateTime<Utc>) {
        let opening_offer = self.nomination.as_ref().and_then(|n| n.opening_offer);
        let base_price = player.quotation.max(1);

        // A rubata opening offer is the nominator's real first bid: if
        // nobody counters, the steal lands at that price.
        let bids = match opening_offer {
            Some(offer) => vec![Bid {
                id: Uuid::new_v4(),
                bidder: nominator.clone(),
                amount: offer,
                placed_at: now,
            }],
            None => Vec::new(),
        };
        let current_price = bids.first().map(|b| b.amount).unwrap_or(base_price);

        self.auction = Some(Auction {
            player_id: player.id,
            base_price,
            current_price,
            bids,
            expires_at: timer::start(self.auction_timer_seconds, now),
        });
        self.state = SessionState::Bidding;
    }

    /// Place a bid on the live auction. Every accepted bid strictly
    /// raises the price and restarts the timer window.
    pub fn place_bid(
        &mut self,
        bidder: &Bidder,
        role: Role,
        amount: i64,
        finance: &MemberFinance,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Bidding {
            return Err(AuctionError::InvalidState { expected: "Bidding" });
        }
        if !self.is_active_member(bidder.member_id) {
            return Err(AuctionError::Forbidden);
        }
        let timer_seconds = self.auction_timer_seconds;
        let auction = self.auction.as_mut().ok_or_else(|| AuctionError::Corrupt {
            detail: "bidding without auction".to_string(),
        })?;

        if timer::is_expired(auction.expires_at, now) {
            return Err(AuctionError::TimerExpired);
        }
        if amount <= auction.current_price {
            return Err(AuctionError::BidTooLow {
                current: auction.current_price,
            });
        }
        if amount > finance.budget {
            return Err(AuctionError::InsufficientBudget {
                budget: finance.budget,
            });
        }
        if finance.slot.is_full() {
            return Err(AuctionError::RoleSlotFull { role });
        }

        auction.bids.insert(
            0,
            Bid {
                id: Uuid::new_v4(),
                bidder: bidder.clone(),
                amount,
                placed_at: now,
            },
        );
        auction.current_price = amount;
        auction.expires_at = timer::reset(timer_seconds, now);
        Ok(())
    }

    /// System-triggered resolution: converts an expired auction into an
    /// acknowledgment round. Returns `None` when there is nothing to do
    /// (not bidding, or the timer is still running).
    pub fn resolve_expired(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<AuctionOutcome>, AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Bidding {
            return Ok(None);
        }
        let expired = self
            .auction
            .as_ref()
            .map(|a| timer::is_expired(a.expires_at, now))
            .unwrap_or(false);
        if !expired {
            return Ok(None);
        }
        self.resolve().map(Some)
    }

    /// Admin override with the same effect as timer expiry.
    pub fn close_auction(&mut self) -> Result<AuctionOutcome, AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Bidding {
            return Err(AuctionError::InvalidState { expected: "Bidding" });
        }
        self.resolve()
    }

    fn resolve(&mut self) -> Result<AuctionOutcome, AuctionError> {
        let auction = self.auction.take().ok_or_else(|| AuctionError::Corrupt {
            detail: "bidding without auction".to_string(),
        })?;
        let winner = auction.bids.first().map(|top| Winner {
            member_id: top.bidder.member_id,
            amount: auction.current_price,
        });

        self.pending_ack = Some(PendingAck {
            player_id: auction.player_id,
            winner_id: winner.as_ref().map(|w| w.member_id),
            final_price: auction.current_price,
            acknowledged: BTreeSet::new(),
            pending: self.turn_order.iter().copied().collect(),
        });
        self.state = SessionState::Acknowledgment;

        Ok(AuctionOutcome {
            player_id: auction.player_id,
            winner,
        })
    }

    /// Member confirms they saw the resolution. The round closes and the
    /// turn advances only after every active member has acknowledged.
    /// Acknowledging twice is a no-op.
    pub fn acknowledge(&mut self, member_id: i64) -> Result<AckProgress, AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Acknowledgment {
            return Err(AuctionError::InvalidState {
                expected: "Acknowledgment",
            });
        }
        let ack = self
            .pending_ack
            .as_mut()
            .ok_or_else(|| AuctionError::Corrupt {
                detail: "acknowledgment without pending ack".to_string(),
            })?;

        if ack.pending.remove(&member_id) {
            ack.acknowledged.insert(member_id);
        } else if !ack.acknowledged.contains(&member_id) {
            return Err(AuctionError::Forbidden);
        }

        if ack.is_complete() {
            self.complete_round()?;
            return Ok(AckProgress::Complete);
        }
        Ok(AckProgress::Pending)
    }

    /// Admin override for a stalled acknowledgment round.
    pub fn force_acknowledge_all(&mut self) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        if self.state != SessionState::Acknowledgment {
            return Err(AuctionError::InvalidState {
                expected: "Acknowledgment",
            });
        }
        if let Some(ack) = self.pending_ack.as_mut() {
            let pending = std::mem::take(&mut ack.pending);
            ack.acknowledged.extend(pending);
        }
        self.complete_round()
    }

    fn complete_round(&mut self) -> Result<(), AuctionError> {
        self.pending_ack = None;
        self.nomination = None;
        self.ready_members.clear();
        self.current_turn_index = turn::advance(self.turn_order.len(), self.current_turn_index)?;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Turn member declines to nominate (rubata/svincolati only). When
    /// every active member passes consecutively the round is finished
    /// and the league phase can advance.
    pub fn pass_turn(&mut self, member_id: i64) -> Result<PassOutcome, AuctionError> {
        self.ensure_not_frozen()?;
        if !self.mode.allows_pass() {
            return Err(AuctionError::InvalidState {
                expected: "Rubata or Svincolati",
            });
        }
        if self.state != SessionState::Idle {
            return Err(AuctionError::InvalidState { expected: "Idle" });
        }
        if member_id != self.current_turn_member()? {
            return Err(AuctionError::NotYourTurn);
        }

        self.passed_members.insert(member_id);
        self.current_turn_index = turn::advance(self.turn_order.len(), self.current_turn_index)?;

        let all_passed = self
            .turn_order
            .iter()
            .all(|id| self.passed_members.contains(id));
        if all_passed {
            return Ok(PassOutcome::RoundFinished);
        }
        Ok(PassOutcome::Continued)
    }

    /// Drop a member who left the league. Their relative position is
    /// removed from the order and from any transient set; an
    /// acknowledgment round they were the last holdout of completes.
    pub fn remove_member(&mut self, member_id: i64) -> Result<(), AuctionError> {
        self.ensure_not_frozen()?;
        self.current_turn_index = turn::retain(
            &mut self.turn_order,
            self.current_turn_index,
            |id| id != member_id,
        )?;
        self.ready_members.remove(&member_id);
        self.passed_members.remove(&member_id);
        let ack_complete = match self.pending_ack.as_mut() {
            Some(ack) => {
                ack.pending.remove(&member_id);
                ack.acknowledged.remove(&member_id);
                ack.is_complete()
            }
            None => false,
        };
        if ack_complete && self.state == SessionState::Acknowledgment {
            self.complete_round()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const TIMER: i64 = 30;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 0).unwrap()
    }

    fn player(id: i64, role: Role, quotation: i64) -> Player {
        Player {
            id,
            name: format!("Player {id}"),
            team: "Torino".to_string(),
            role,
            quotation,
            age: Some(27),
        }
    }

    fn free(player: Player) -> PlayerStatus {
        PlayerStatus {
            player,
            owner: None,
        }
    }

    fn owned(player: Player, owner: i64) -> PlayerStatus {
        PlayerStatus {
            player,
            owner: Some(owner),
        }
    }

    fn bidder(member_id: i64) -> Bidder {
        Bidder {
            member_id,
            username: format!("user{member_id}"),
            team_name: format!("team{member_id}"),
        }
    }

    fn finance(budget: i64) -> MemberFinance {
        MemberFinance {
            budget,
            slot: crate::types::RoleSlot { filled: 0, total: 3 },
        }
    }

    fn session(mode: AuctionMode) -> MarketSession {
        MarketSession::open(1, 1, mode, vec![10, 20, 30], TIMER)
    }

    /// Drive a fresh first-market session to the bidding state.
    fn bidding_session(p: &Player) -> MarketSession {
        let mut s = session(AuctionMode::FirstMarket);
        s.nominate(10, &free(p.clone()), None, &finance(100)).unwrap();
        s.confirm_nomination(10).unwrap();
        assert!(!s.mark_ready(20, p, &bidder(10), t0()).unwrap());
        assert!(s.mark_ready(30, p, &bidder(10), t0()).unwrap());
        s
    }

    // ---- nomination ----

    #[test]
    fn test_nominate_out_of_turn_rejected() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = free(player(1, Role::Goalkeeper, 5));
        let err = s.nominate(20, &p, None, &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::NotYourTurn));
        assert_eq!(s.state, SessionState::Idle);
    }

    #[test]
    fn test_nominate_owned_player_rejected() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = owned(player(1, Role::Goalkeeper, 5), 30);
        let err = s.nominate(10, &p, None, &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::PlayerUnavailable));
    }

    #[test]
    fn test_first_market_restricts_to_current_role() {
        let mut s = session(AuctionMode::FirstMarket);
        // board is on goalkeepers; a forward is not nominable yet
        let p = free(player(1, Role::Forward, 20));
        let err = s.nominate(10, &p, None, &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::PlayerUnavailable));
    }

    #[test]
    fn test_double_nomination_rejected() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = free(player(1, Role::Goalkeeper, 5));
        s.nominate(10, &p, None, &finance(100)).unwrap();
        let err = s.nominate(10, &p, None, &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::InvalidState { .. }));
    }

    #[test]
    fn test_confirm_by_other_member_forbidden() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = free(player(1, Role::Goalkeeper, 5));
        s.nominate(10, &p, None, &finance(100)).unwrap();
        assert!(matches!(
            s.confirm_nomination(20),
            Err(AuctionError::Forbidden)
        ));
    }

    #[test]
    fn test_cancel_only_before_confirmation() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = free(player(1, Role::Goalkeeper, 5));
        s.nominate(10, &p, None, &finance(100)).unwrap();
        s.confirm_nomination(10).unwrap();
        assert!(matches!(
            s.cancel_nomination(10),
            Err(AuctionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = free(player(1, Role::Goalkeeper, 5));
        s.nominate(10, &p, None, &finance(100)).unwrap();
        s.cancel_nomination(10).unwrap();
        assert_eq!(s.state, SessionState::Idle);
        assert!(s.nomination.is_none());
        assert!(s.validate().is_ok());
    }

    // ---- ready check ----

    #[test]
    fn test_ready_completion_starts_bidding_at_quotation() {
        let p = player(1, Role::Goalkeeper, 7);
        let s = bidding_session(&p);
        assert_eq!(s.state, SessionState::Bidding);
        let auction = s.auction.as_ref().unwrap();
        assert_eq!(auction.base_price, 7);
        assert_eq!(auction.current_price, 7);
        assert!(auction.bids.is_empty());
        assert_eq!(timer::remaining_seconds(auction.expires_at, t0()), TIMER);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_nominator_cannot_mark_ready() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = player(1, Role::Goalkeeper, 5);
        s.nominate(10, &free(p.clone()), None, &finance(100)).unwrap();
        s.confirm_nomination(10).unwrap();
        assert!(matches!(
            s.mark_ready(10, &p, &bidder(10), t0()),
            Err(AuctionError::Forbidden)
        ));
    }

    #[test]
    fn test_force_all_ready_bypasses_stragglers() {
        let mut s = session(AuctionMode::FirstMarket);
        let p = player(1, Role::Goalkeeper, 5);
        s.nominate(10, &free(p.clone()), None, &finance(100)).unwrap();
        s.confirm_nomination(10).unwrap();
        s.mark_ready(20, &p, &bidder(10), t0()).unwrap();
        // member 30 is stuck; admin forces the step with a full window
        s.force_all_ready(&p, &bidder(10), t0()).unwrap();
        assert_eq!(s.state, SessionState::Bidding);
        let auction = s.auction.as_ref().unwrap();
        assert_eq!(timer::remaining_seconds(auction.expires_at, t0()), TIMER);
    }

    // ---- bidding ----

    #[test]
    fn test_bid_sequence_and_resolution() {
        // base 1, A bids 5, B bids 8, expiry: B wins at 8
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.place_bid(&bidder(10), p.role, 5, &finance(100), t0()).unwrap();
        s.place_bid(&bidder(20), p.role, 8, &finance(100), t0() + Duration::seconds(5))
            .unwrap();

        let auction = s.auction.as_ref().unwrap();
        assert_eq!(auction.current_price, 8);
        assert_eq!(auction.bids.len(), 2);
        assert_eq!(auction.bids[0].bidder.member_id, 20);
        assert_eq!(auction.bids[0].amount, 8);
        assert_eq!(auction.bids[1].bidder.member_id, 10);

        let outcome = s
            .resolve_expired(t0() + Duration::seconds(5 + TIMER))
            .unwrap()
            .unwrap();
        assert_eq!(
            outcome.winner,
            Some(Winner {
                member_id: 20,
                amount: 8
            })
        );
        assert_eq!(s.state, SessionState::Acknowledgment);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_equal_bid_rejected_against_updated_price() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.place_bid(&bidder(10), p.role, 5, &finance(100), t0()).unwrap();
        // the second bid of 5 loses the race and sees the committed price
        let err = s
            .place_bid(&bidder(20), p.role, 5, &finance(100), t0())
            .unwrap_err();
        assert!(matches!(err, AuctionError::BidTooLow { current: 5 }));
        assert_eq!(s.auction.as_ref().unwrap().bids.len(), 1);
    }

    #[test]
    fn test_bid_over_budget_rejected_without_mutation() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        let before = s.auction.clone().unwrap();
        let err = s
            .place_bid(&bidder(10), p.role, 10, &finance(8), t0())
            .unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientBudget { budget: 8 }));
        let after = s.auction.as_ref().unwrap();
        assert_eq!(after.current_price, before.current_price);
        assert_eq!(after.bids.len(), before.bids.len());
        assert_eq!(after.expires_at, before.expires_at);
    }

    #[test]
    fn test_bid_with_full_role_slot_rejected() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        let full = MemberFinance {
            budget: 100,
            slot: crate::types::RoleSlot { filled: 3, total: 3 },
        };
        let err = s
            .place_bid(&bidder(10), p.role, 5, &full, t0())
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::RoleSlotFull {
                role: Role::Goalkeeper
            }
        ));
    }

    #[test]
    fn test_late_bid_rejected_after_expiry() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        let late = t0() + Duration::seconds(TIMER + 1);
        let err = s
            .place_bid(&bidder(10), p.role, 5, &finance(100), late)
            .unwrap_err();
        assert!(matches!(err, AuctionError::TimerExpired));
    }

    #[test]
    fn test_accepted_bid_restarts_timer_window() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        let first_expiry = s.auction.as_ref().unwrap().expires_at;
        let near_end = t0() + Duration::seconds(TIMER - 2);
        s.place_bid(&bidder(20), p.role, 4, &finance(100), near_end)
            .unwrap();
        let new_expiry = s.auction.as_ref().unwrap().expires_at;
        assert!(new_expiry > first_expiry);
        assert_eq!(timer::remaining_seconds(new_expiry, near_end), TIMER);
    }

    #[test]
    fn test_resolve_before_expiry_is_noop() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        let result = s.resolve_expired(t0() + Duration::seconds(5)).unwrap();
        assert!(result.is_none());
        assert_eq!(s.state, SessionState::Bidding);
    }

    #[test]
    fn test_expiry_with_no_bids_returns_player_to_pool() {
        let p = player(1, Role::Goalkeeper, 3);
        let mut s = bidding_session(&p);
        let outcome = s
            .resolve_expired(t0() + Duration::seconds(TIMER))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.winner, None);
        let ack = s.pending_ack.as_ref().unwrap();
        assert_eq!(ack.winner_id, None);
        assert_eq!(ack.pending.len(), 3);
        assert!(ack.acknowledged.is_empty());
    }

    #[test]
    fn test_admin_close_matches_expiry_effect() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.place_bid(&bidder(30), p.role, 6, &finance(50), t0()).unwrap();
        let outcome = s.close_auction().unwrap();
        assert_eq!(
            outcome.winner,
            Some(Winner {
                member_id: 30,
                amount: 6
            })
        );
        assert_eq!(s.state, SessionState::Acknowledgment);
    }

    // ---- acknowledgment ----

    #[test]
    fn test_ack_round_requires_every_member() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.resolve_expired(t0() + Duration::seconds(TIMER)).unwrap();

        assert_eq!(s.acknowledge(10).unwrap(), AckProgress::Pending);
        assert_eq!(s.acknowledge(20).unwrap(), AckProgress::Pending);
        assert_eq!(s.state, SessionState::Acknowledgment);
        assert_eq!(s.acknowledge(30).unwrap(), AckProgress::Complete);

        assert_eq!(s.state, SessionState::Idle);
        assert!(s.pending_ack.is_none());
        assert!(s.nomination.is_none());
        // the turn moved on to the next member
        assert_eq!(s.current_turn_member().unwrap(), 20);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_double_acknowledge_is_noop() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.resolve_expired(t0() + Duration::seconds(TIMER)).unwrap();
        s.acknowledge(10).unwrap();
        assert_eq!(s.acknowledge(10).unwrap(), AckProgress::Pending);
        let ack = s.pending_ack.as_ref().unwrap();
        assert_eq!(ack.acknowledged.len(), 1);
    }

    #[test]
    fn test_force_acknowledge_unblocks_round() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.resolve_expired(t0() + Duration::seconds(TIMER)).unwrap();
        s.acknowledge(10).unwrap();
        s.force_acknowledge_all().unwrap();
        assert_eq!(s.state, SessionState::Idle);
        assert_eq!(s.current_turn_member().unwrap(), 20);
    }

    // ---- pass / svincolati ----

    #[test]
    fn test_pass_not_allowed_in_first_market() {
        let mut s = session(AuctionMode::FirstMarket);
        assert!(matches!(
            s.pass_turn(10),
            Err(AuctionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_all_pass_finishes_round() {
        let mut s = session(AuctionMode::Svincolati);
        assert_eq!(s.pass_turn(10).unwrap(), PassOutcome::Continued);
        assert_eq!(s.pass_turn(20).unwrap(), PassOutcome::Continued);
        assert_eq!(s.pass_turn(30).unwrap(), PassOutcome::RoundFinished);
    }

    #[test]
    fn test_nomination_resets_pass_streak() {
        let mut s = session(AuctionMode::Svincolati);
        s.pass_turn(10).unwrap();
        s.pass_turn(20).unwrap();
        let p = free(player(1, Role::Forward, 10));
        s.nominate(30, &p, None, &finance(100)).unwrap();
        assert!(s.passed_members.is_empty());
    }

    // ---- rubata ----

    #[test]
    fn test_rubata_requires_offer_at_quotation() {
        let mut s = session(AuctionMode::Rubata);
        let p = owned(player(1, Role::Forward, 15), 20);
        let err = s.nominate(10, &p, Some(12), &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::OfferTooLow { minimum: 15 }));
    }

    #[test]
    fn test_rubata_cannot_target_own_player() {
        let mut s = session(AuctionMode::Rubata);
        let p = owned(player(1, Role::Forward, 15), 10);
        let err = s.nominate(10, &p, Some(20), &finance(100)).unwrap_err();
        assert!(matches!(err, AuctionError::PlayerUnavailable));
    }

    #[test]
    fn test_rubata_opening_offer_is_first_bid() {
        let mut s = session(AuctionMode::Rubata);
        let p = player(1, Role::Forward, 15);
        s.nominate(10, &owned(p.clone(), 20), Some(18), &finance(100))
            .unwrap();
        s.confirm_nomination(10).unwrap();
        s.mark_ready(20, &p, &bidder(10), t0()).unwrap();
        s.mark_ready(30, &p, &bidder(10), t0()).unwrap();

        let auction = s.auction.as_ref().unwrap();
        assert_eq!(auction.current_price, 18);
        assert_eq!(auction.bids.len(), 1);
        assert_eq!(auction.bids[0].bidder.member_id, 10);
        assert!(s.validate().is_ok());

        // unchallenged: the steal lands at the opening offer
        let outcome = s
            .resolve_expired(t0() + Duration::seconds(TIMER))
            .unwrap()
            .unwrap();
        assert_eq!(
            outcome.winner,
            Some(Winner {
                member_id: 10,
                amount: 18
            })
        );
    }

    // ---- frozen / membership ----

    #[test]
    fn test_frozen_session_rejects_everything() {
        let mut s = session(AuctionMode::FirstMarket);
        s.frozen = true;
        let p = free(player(1, Role::Goalkeeper, 5));
        assert!(matches!(
            s.nominate(10, &p, None, &finance(100)),
            Err(AuctionError::SessionFrozen)
        ));
        assert!(matches!(
            s.acknowledge(10),
            Err(AuctionError::SessionFrozen)
        ));
    }

    #[test]
    fn test_leaver_is_skipped_in_turn_order() {
        let mut s = session(AuctionMode::FirstMarket);
        s.remove_member(20).unwrap();
        assert_eq!(s.turn_order, vec![10, 30]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_leaver_completes_stalled_ack_round() {
        let p = player(1, Role::Goalkeeper, 1);
        let mut s = bidding_session(&p);
        s.resolve_expired(t0() + Duration::seconds(TIMER)).unwrap();
        s.acknowledge(10).unwrap();
        s.acknowledge(20).unwrap();
        // member 30 leaves while holding up the round
        s.remove_member(30).unwrap();
        assert_eq!(s.state, SessionState::Idle);
        assert!(s.pending_ack.is_none());
    }
}
