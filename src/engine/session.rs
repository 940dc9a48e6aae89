//! The persisted market-session record.
//!
//! One `MarketSession` exists per league per market window. It is
//! mutated exclusively by the auction engine and validated on every load
//! and save so a partial write can never be trusted blindly.

use crate::engine::errors::AuctionError;
use crate::types::{
    Auction, AuctionMode, PendingAck, PendingNomination, Role, SessionState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSession {
    pub id: i64,
    pub league_id: i64,
    pub mode: AuctionMode,
    pub state: SessionState,
    /// Role currently on the board in a role-sequenced first market.
    pub current_role: Option<Role>,
    pub role_sequence: Vec<Role>,
    /// Materialized nomination order; stored once, never recomputed.
    pub turn_order: Vec<i64>,
    pub current_turn_index: usize,
    /// Configured bidding-window length.
    pub auction_timer_seconds: i64,
    pub nomination: Option<PendingNomination>,
    pub ready_members: BTreeSet<i64>,
    /// Members who declined their nomination turn this round
    /// (rubata/svincolati pass tracking).
    pub passed_members: BTreeSet<i64>,
    pub auction: Option<Auction>,
    pub pending_ack: Option<PendingAck>,
    /// Set on fatal inconsistency; every mutation is rejected until an
    /// admin repairs the session.
    pub frozen: bool,
}

impl MarketSession {
    /// Fresh session for a league entering a market phase.
    pub fn open(
        id: i64,
        league_id: i64,
        mode: AuctionMode,
        turn_order: Vec<i64>,
        auction_timer_seconds: i64,
    ) -> Self {
        let current_role = match mode {
            AuctionMode::FirstMarket => Some(Role::SEQUENCE[0]),
            _ => None,
        };
        MarketSession {
            id,
            league_id,
            mode,
            state: SessionState::Idle,
            current_role,
            role_sequence: Role::SEQUENCE.to_vec(),
            turn_order,
            current_turn_index: 0,
            auction_timer_seconds,
            nomination: None,
            ready_members: BTreeSet::new(),
            passed_members: BTreeSet::new(),
            auction: None,
            pending_ack: None,
            frozen: false,
        }
    }

    /// Member whose turn it is to nominate.
    pub fn current_turn_member(&self) -> Result<i64, AuctionError> {
        if self.turn_order.is_empty() {
            return Err(AuctionError::EmptyTurnOrder);
        }
        self.turn_order
            .get(self.current_turn_index)
            .copied()
            .ok_or_else(|| AuctionError::Corrupt {
                detail: format!(
                    "turn index {} out of bounds for order of {}",
                    self.current_turn_index,
                    self.turn_order.len()
                ),
            })
    }

    pub fn is_active_member(&self, member_id: i64) -> bool {
        self.turn_order.contains(&member_id)
    }

    /// Advance `current_role` through the configured sequence. Returns
    /// the new role, or `None` when the sequence is exhausted.
    pub fn advance_current_role(&mut self) -> Option<Role> {
        let current = self.current_role?;
        let pos = self.role_sequence.iter().position(|r| *r == current)?;
        let next = self.role_sequence.get(pos + 1).copied();
        self.current_role = next;
        next
    }

    /// Structural invariant check, run on every load and save.
    ///
    /// Exactly one of {idle, nomination pending, ready check, bidding,
    /// ack pending} may hold, the turn index must point into the order,
    /// the timer exists only while bidding, and the bid ladder must be
    /// coherent with the current price.
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.turn_order.is_empty() {
            return Err(AuctionError::EmptyTurnOrder);
        }
        if self.current_turn_index >= self.turn_order.len() {
            return Err(AuctionError::Corrupt {
                detail: format!(
                    "turn index {} out of bounds for order of {}",
                    self.current_turn_index,
                    self.turn_order.len()
                ),
            });
        }

        let field_matrix_ok = match self.state {
            SessionState::Idle => {
                self.nomination.is_none() && self.auction.is_none() && self.pending_ack.is_none()
            }
            SessionState::NominationPending => {
                matches!(&self.nomination, Some(n) if !n.confirmed)
                    && self.auction.is_none()
                    && self.pending_ack.is_none()
            }
            SessionState::ReadyCheck => {
                matches!(&self.nomination, Some(n) if n.confirmed)
                    && self.auction.is_none()
                    && self.pending_ack.is_none()
            }
            SessionState::Bidding => {
                self.nomination.is_some() && self.auction.is_some() && self.pending_ack.is_none()
            }
            SessionState::Acknowledgment => self.auction.is_none() && self.pending_ack.is_some(),
        };
        if !field_matrix_ok {
            return Err(AuctionError::Corrupt {
                detail: format!("state {} with inconsistent fields", self.state.as_str()),
            });
        }

        if let Some(auction) = &self.auction {
            let expected = auction
                .bids
                .first()
                .map(|b| b.amount)
                .unwrap_or(auction.base_price);
            if auction.current_price != expected {
                return Err(AuctionError::Corrupt {
                    detail: format!(
                        "current price {} does not match bid ladder head {}",
                        auction.current_price, expected
                    ),
                });
            }
            // most-recent-first: amounts strictly decrease away from the head
            for pair in auction.bids.windows(2) {
                if pair[0].amount <= pair[1].amount {
                    return Err(AuctionError::Corrupt {
                        detail: "bid ladder is not strictly increasing".to_string(),
                    });
                }
            }
        }

        let members: BTreeSet<i64> = self.turn_order.iter().copied().collect();
        if !self.ready_members.is_subset(&members) || !self.passed_members.is_subset(&members) {
            return Err(AuctionError::Corrupt {
                detail: "ready/pass set references a member outside the turn order".to_string(),
            });
        }
        if let Some(ack) = &self.pending_ack {
            if !ack.acknowledged.is_disjoint(&ack.pending) {
                return Err(AuctionError::Corrupt {
                    detail: "member is both acknowledged and pending".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Auction, Bid, Bidder};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn session() -> MarketSession {
        MarketSession::open(1, 1, AuctionMode::FirstMarket, vec![10, 20, 30], 30)
    }

    fn bid(member_id: i64, amount: i64) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            bidder: Bidder {
                member_id,
                username: format!("user{member_id}"),
                team_name: format!("team{member_id}"),
            },
            amount,
            placed_at: Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_open_session_is_valid_idle() {
        let s = session();
        assert_eq!(s.state, SessionState::Idle);
        assert_eq!(s.current_role, Some(Role::Goalkeeper));
        assert!(s.validate().is_ok());
        assert_eq!(s.current_turn_member().unwrap(), 10);
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_turn_index() {
        let mut s = session();
        s.current_turn_index = 9;
        assert!(matches!(s.validate(), Err(AuctionError::Corrupt { .. })));
    }

    #[test]
    fn test_validate_rejects_idle_with_auction() {
        let mut s = session();
        s.auction = Some(Auction {
            player_id: 1,
            base_price: 1,
            current_price: 1,
            bids: vec![],
            expires_at: Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 30).unwrap(),
        });
        assert!(matches!(s.validate(), Err(AuctionError::Corrupt { .. })));
    }

    #[test]
    fn test_validate_rejects_price_ladder_mismatch() {
        let mut s = session();
        s.state = SessionState::Bidding;
        s.nomination = Some(PendingNomination {
            player_id: 1,
            nominator_id: 10,
            confirmed: true,
            opening_offer: None,
        });
        s.auction = Some(Auction {
            player_id: 1,
            base_price: 1,
            current_price: 7,
            bids: vec![bid(20, 5)],
            expires_at: Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 30).unwrap(),
        });
        assert!(matches!(s.validate(), Err(AuctionError::Corrupt { .. })));
    }

    #[test]
    fn test_validate_rejects_non_increasing_ladder() {
        let mut s = session();
        s.state = SessionState::Bidding;
        s.nomination = Some(PendingNomination {
            player_id: 1,
            nominator_id: 10,
            confirmed: true,
            opening_offer: None,
        });
        s.auction = Some(Auction {
            player_id: 1,
            base_price: 1,
            current_price: 5,
            bids: vec![bid(20, 5), bid(30, 5)],
            expires_at: Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 30).unwrap(),
        });
        assert!(matches!(s.validate(), Err(AuctionError::Corrupt { .. })));
    }

    #[test]
    fn test_role_sequence_advances_and_exhausts() {
        let mut s = session();
        assert_eq!(s.advance_current_role(), Some(Role::Defender));
        assert_eq!(s.advance_current_role(), Some(Role::Midfielder));
        assert_eq!(s.advance_current_role(), Some(Role::Forward));
        assert_eq!(s.advance_current_role(), None);
        assert_eq!(s.current_role, None);
    }

    #[test]
    fn test_serde_round_trip() {
        let s = session();
        let json = serde_json::to_string(&s).unwrap();
        let back: MarketSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.turn_order, s.turn_order);
        assert_eq!(back.state, s.state);
        assert!(back.validate().is_ok());
    }
}
