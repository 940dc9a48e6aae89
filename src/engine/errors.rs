//! Typed error taxonomy for the auction engine.
//!
//! Four classes with different handling:
//! - Validation: user-correctable, reported inline, no retry.
//! - Authorization: reported inline, never silently ignored.
//! - State conflict: race fallout; the client refreshes from the last
//!   broadcast state and may retry against it.
//! - Fatal: not user-recoverable; the session is frozen until an admin
//!   repairs it.

use crate::types::Role;
use thiserror::Error;

/// Everything an auction-room action can fail with.
#[derive(Debug, Clone, Error)]
pub enum AuctionError {
    // ---- Validation ----
    #[error("bid must exceed the current price of {current}")]
    BidTooLow { current: i64 },

    #[error("bid exceeds your remaining budget of {budget}")]
    InsufficientBudget { budget: i64 },

    #[error("all {role} slots are already filled")]
    RoleSlotFull { role: Role },

    #[error("player is not available for nomination")]
    PlayerUnavailable,

    #[error("opening offer must be at least {minimum}")]
    OfferTooLow { minimum: i64 },

    // ---- Authorization ----
    #[error("it is not your turn to nominate")]
    NotYourTurn,

    #[error("you are not allowed to perform this action")]
    Forbidden,

    // ---- State conflict ----
    #[error("action not valid in the current session state (expected {expected})")]
    InvalidState { expected: &'static str },

    #[error("the auction timer has already expired")]
    TimerExpired,

    // ---- Fatal ----
    #[error("session has an empty turn order and cannot progress")]
    EmptyTurnOrder,

    #[error("session is frozen pending admin repair")]
    SessionFrozen,

    #[error("market session not found")]
    SessionNotFound,

    #[error("session state is corrupt: {detail}")]
    Corrupt { detail: String },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification used for HTTP status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Authorization,
    StateConflict,
    NotFound,
    Fatal,
}

impl AuctionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuctionError::BidTooLow { .. }
            | AuctionError::InsufficientBudget { .. }
            | AuctionError::RoleSlotFull { .. }
            | AuctionError::PlayerUnavailable
            | AuctionError::OfferTooLow { .. } => ErrorClass::Validation,
            AuctionError::NotYourTurn | AuctionError::Forbidden => ErrorClass::Authorization,
            AuctionError::InvalidState { .. } | AuctionError::TimerExpired => {
                ErrorClass::StateConflict
            }
            AuctionError::SessionNotFound => ErrorClass::NotFound,
            AuctionError::EmptyTurnOrder
            | AuctionError::SessionFrozen
            | AuctionError::Corrupt { .. }
            | AuctionError::Storage(_) => ErrorClass::Fatal,
        }
    }

    /// Fatal errors freeze the session; everything else is returned to the
    /// acting client and forgotten.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::BidTooLow { .. } => "bid_too_low",
            AuctionError::InsufficientBudget { .. } => "insufficient_budget",
            AuctionError::RoleSlotFull { .. } => "role_slot_full",
            AuctionError::PlayerUnavailable => "player_unavailable",
            AuctionError::OfferTooLow { .. } => "offer_too_low",
            AuctionError::NotYourTurn => "not_your_turn",
            AuctionError::Forbidden => "forbidden",
            AuctionError::InvalidState { .. } => "invalid_state",
            AuctionError::TimerExpired => "timer_expired",
            AuctionError::EmptyTurnOrder => "empty_turn_order",
            AuctionError::SessionFrozen => "session_frozen",
            AuctionError::SessionNotFound => "session_not_found",
            AuctionError::Corrupt { .. } => "corrupt_session",
            AuctionError::Storage(_) => "storage_error",
        }
    }
}

impl From<sqlx::Error> for AuctionError {
    fn from(err: sqlx::Error) -> Self {
        AuctionError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for AuctionError {
    fn from(err: anyhow::Error) -> Self {
        AuctionError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_class() {
        let err = AuctionError::BidTooLow { current: 12 };
        assert_eq!(err.class(), ErrorClass::Validation);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_conflict_class() {
        assert_eq!(
            AuctionError::TimerExpired.class(),
            ErrorClass::StateConflict
        );
    }

    #[test]
    fn test_fatal_freezes() {
        assert!(AuctionError::EmptyTurnOrder.is_fatal());
        assert!(AuctionError::Corrupt { detail: "x".into() }.is_fatal());
        assert!(!AuctionError::NotYourTurn.is_fatal());
    }
}
