//! Core domain types for the fantacalcio auction server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Player role, in the P/D/C/A notation used by the classic listone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "P")]
    Goalkeeper,
    #[serde(rename = "D")]
    Defender,
    #[serde(rename = "C")]
    Midfielder,
    #[serde(rename = "A")]
    Forward,
}

impl Role {
    /// Default role sequence for a role-sequenced first market.
    pub const SEQUENCE: [Role; 4] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::Forward,
    ];

    pub fn letter(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "P",
            Role::Defender => "D",
            Role::Midfielder => "C",
            Role::Forward => "A",
        }
    }

    pub fn from_letter(s: &str) -> Option<Role> {
        match s {
            "P" => Some(Role::Goalkeeper),
            "D" => Some(Role::Defender),
            "C" => Some(Role::Midfielder),
            "A" => Some(Role::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// League lifecycle phase. The auction engine runs only inside
/// FirstMarket, Rubata and Svincolati.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaguePhase {
    Setup,
    FirstMarket,
    Contracts,
    Rubata,
    Svincolati,
    Prizes,
    Completed,
}

impl LeaguePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaguePhase::Setup => "Setup",
            LeaguePhase::FirstMarket => "FirstMarket",
            LeaguePhase::Contracts => "Contracts",
            LeaguePhase::Rubata => "Rubata",
            LeaguePhase::Svincolati => "Svincolati",
            LeaguePhase::Prizes => "Prizes",
            LeaguePhase::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<LeaguePhase> {
        match s {
            "Setup" => Some(LeaguePhase::Setup),
            "FirstMarket" => Some(LeaguePhase::FirstMarket),
            "Contracts" => Some(LeaguePhase::Contracts),
            "Rubata" => Some(LeaguePhase::Rubata),
            "Svincolati" => Some(LeaguePhase::Svincolati),
            "Prizes" => Some(LeaguePhase::Prizes),
            "Completed" => Some(LeaguePhase::Completed),
            _ => None,
        }
    }

    /// Phase that follows when the current one completes.
    pub fn next(&self) -> Option<LeaguePhase> {
        match self {
            LeaguePhase::Setup => Some(LeaguePhase::FirstMarket),
            LeaguePhase::FirstMarket => Some(LeaguePhase::Contracts),
            LeaguePhase::Contracts => Some(LeaguePhase::Rubata),
            LeaguePhase::Rubata => Some(LeaguePhase::Svincolati),
            LeaguePhase::Svincolati => Some(LeaguePhase::Prizes),
            LeaguePhase::Prizes => Some(LeaguePhase::Completed),
            LeaguePhase::Completed => None,
        }
    }

    /// The auction mode embedded in this phase, if any.
    pub fn auction_mode(&self) -> Option<AuctionMode> {
        match self {
            LeaguePhase::FirstMarket => Some(AuctionMode::FirstMarket),
            LeaguePhase::Rubata => Some(AuctionMode::Rubata),
            LeaguePhase::Svincolati => Some(AuctionMode::Svincolati),
            _ => None,
        }
    }
}

impl fmt::Display for LeaguePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three auction flavors. One parametrized state machine serves all
/// of them; the mode only changes how a player enters the block and how
/// a round ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionMode {
    FirstMarket,
    Rubata,
    Svincolati,
}

impl AuctionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionMode::FirstMarket => "FirstMarket",
            AuctionMode::Rubata => "Rubata",
            AuctionMode::Svincolati => "Svincolati",
        }
    }

    pub fn parse(s: &str) -> Option<AuctionMode> {
        match s {
            "FirstMarket" => Some(AuctionMode::FirstMarket),
            "Rubata" => Some(AuctionMode::Rubata),
            "Svincolati" => Some(AuctionMode::Svincolati),
            _ => None,
        }
    }

    /// Turn members may decline to nominate in the steal and free-agent
    /// rounds; the first market always forces a pick.
    pub fn allows_pass(&self) -> bool {
        !matches!(self, AuctionMode::FirstMarket)
    }

    /// League phase this mode belongs to.
    pub fn league_phase(&self) -> LeaguePhase {
        match self {
            AuctionMode::FirstMarket => LeaguePhase::FirstMarket,
            AuctionMode::Rubata => LeaguePhase::Rubata,
            AuctionMode::Svincolati => LeaguePhase::Svincolati,
        }
    }
}

impl fmt::Display for AuctionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Auction-room sub-state. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    NominationPending,
    ReadyCheck,
    Bidding,
    Acknowledgment,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::NominationPending => "NominationPending",
            SessionState::ReadyCheck => "ReadyCheck",
            SessionState::Bidding => "Bidding",
            SessionState::Acknowledgment => "Acknowledgment",
        }
    }

    pub fn parse(s: &str) -> Option<SessionState> {
        match s {
            "Idle" => Some(SessionState::Idle),
            "NominationPending" => Some(SessionState::NominationPending),
            "ReadyCheck" => Some(SessionState::ReadyCheck),
            "Bidding" => Some(SessionState::Bidding),
            "Acknowledgment" => Some(SessionState::Acknowledgment),
            _ => None,
        }
    }
}

/// A league.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub phase: LeaguePhase,
    /// Whole credits granted to each member at setup.
    pub budget_per_member: i64,
    pub slots_goalkeeper: u32,
    pub slots_defender: u32,
    pub slots_midfielder: u32,
    pub slots_forward: u32,
    pub created_at: DateTime<Utc>,
}

impl League {
    pub fn slots_for(&self, role: Role) -> u32 {
        match role {
            Role::Goalkeeper => self.slots_goalkeeper,
            Role::Defender => self.slots_defender,
            Role::Midfielder => self.slots_midfielder,
            Role::Forward => self.slots_forward,
        }
    }
}

/// A league participant (DG).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub league_id: i64,
    pub username: String,
    pub team_name: String,
    pub is_admin: bool,
    /// Remaining whole credits. Never negative.
    pub budget: i64,
    pub is_connected: bool,
    pub joined_at: DateTime<Utc>,
}

/// A listone player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub role: Role,
    /// Nominal market valuation; the auction base price derives from it.
    pub quotation: i64,
    pub age: Option<i64>,
}

/// Fill state of one role's roster slots for one member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoleSlot {
    pub filled: u32,
    pub total: u32,
}

impl RoleSlot {
    pub fn is_full(&self) -> bool {
        self.filled >= self.total
    }
}

/// A member's committed financial state, read inside the same
/// transaction boundary as the mutation it guards.
#[derive(Debug, Clone, Copy)]
pub struct MemberFinance {
    pub budget: i64,
    pub slot: RoleSlot,
}

/// A player plus its ownership within a league.
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    pub player: Player,
    /// Member currently holding the player in this league, if any.
    pub owner: Option<i64>,
}

/// Identity shown next to a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bidder {
    pub member_id: i64,
    pub username: String,
    pub team_name: String,
}

/// One accepted bid. The bid list is kept most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub bidder: Bidder,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

/// The currently-active single-player auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub player_id: i64,
    pub base_price: i64,
    pub current_price: i64,
    /// Most-recent-first; amounts strictly increase toward the head.
    pub bids: Vec<Bid>,
    pub expires_at: DateTime<Utc>,
}

/// Nomination awaiting confirmation or ready-check completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNomination {
    pub player_id: i64,
    pub nominator_id: i64,
    pub confirmed: bool,
    /// Rubata only: the offer that put the player on the block.
    pub opening_offer: Option<i64>,
}

/// Per-resolution acknowledgment round. The active-member set is
/// captured when the round is entered and never regrows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAck {
    pub player_id: i64,
    pub winner_id: Option<i64>,
    pub final_price: i64,
    pub acknowledged: BTreeSet<i64>,
    pub pending: BTreeSet<i64>,
}

impl PendingAck {
    pub fn total_members(&self) -> usize {
        self.acknowledged.len() + self.pending.len()
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

// ==================== PUBLIC SNAPSHOT DTOs ====================

/// Player fields exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub role: Role,
    pub quotation: i64,
    pub age: Option<i64>,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        PlayerView {
            id: p.id,
            name: p.name.clone(),
            team: p.team.clone(),
            role: p.role,
            quotation: p.quotation,
            age: p.age,
        }
    }
}

/// Member fields exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub member_id: i64,
    pub username: String,
    pub team_name: String,
}

impl From<&Member> for MemberView {
    fn from(m: &Member) -> Self {
        MemberView {
            member_id: m.id,
            username: m.username.clone(),
            team_name: m.team_name.clone(),
        }
    }
}

/// Live auction as rendered by clients. `remaining_seconds` is cosmetic;
/// the broadcast `expires_at` stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionView {
    pub player: PlayerView,
    pub base_price: i64,
    pub current_price: i64,
    pub bids: Vec<Bid>,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
}

/// Ready-check progress for the pending nomination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyStatus {
    pub player: PlayerView,
    pub nominator_username: String,
    pub nominator_confirmed: bool,
    pub ready_members: Vec<MemberView>,
    pub pending_members: Vec<MemberView>,
    pub ready_count: usize,
    pub total_members: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_is_nominator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_is_ready: Option<bool>,
}

/// Acknowledgment progress for the last resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckStatus {
    pub player: PlayerView,
    pub winner: Option<MemberView>,
    pub final_price: i64,
    pub acknowledged_members: Vec<MemberView>,
    pub pending_members: Vec<MemberView>,
    pub total_members: usize,
    pub total_acknowledged: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_acknowledged: Option<bool>,
}

/// Full public state of a market session. Broadcast after every
/// committed transition; clients re-render from it wholesale. The
/// `user_*` flags are filled only on per-viewer REST reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: i64,
    pub league_id: i64,
    pub mode: AuctionMode,
    pub state: SessionState,
    pub current_role: Option<Role>,
    pub turn_order: Vec<MemberView>,
    pub current_turn: MemberView,
    pub auction_timer_seconds: i64,
    pub auction: Option<AuctionView>,
    pub ready: Option<ReadyStatus>,
    pub ack: Option<AckStatus>,
    pub passed_members: Vec<MemberView>,
    pub frozen: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_letters_round_trip() {
        for role in Role::SEQUENCE {
            assert_eq!(Role::from_letter(role.letter()), Some(role));
        }
        assert_eq!(Role::from_letter("X"), None);
    }

    #[test]
    fn test_phase_progression_ends_at_completed() {
        let mut phase = LeaguePhase::Setup;
        let mut steps = 0;
        while let Some(next) = phase.next() {
            phase = next;
            steps += 1;
        }
        assert_eq!(phase, LeaguePhase::Completed);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_pass_allowed_by_mode() {
        assert!(!AuctionMode::FirstMarket.allows_pass());
        assert!(AuctionMode::Rubata.allows_pass());
        assert!(AuctionMode::Svincolati.allows_pass());
    }

    #[test]
    fn test_role_slot_full() {
        assert!(RoleSlot { filled: 3, total: 3 }.is_full());
        assert!(!RoleSlot { filled: 2, total: 3 }.is_full());
    }

    #[test]
    fn test_role_serde_uses_letters() {
        let json = serde_json::to_string(&Role::Forward).unwrap();
        assert_eq!(json, "\"A\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::Forward);
    }
}
