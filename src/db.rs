//! SQLite persistence for leagues, members, the listone, rosters and
//! market sessions.
//!
//! The market-session record is stored as typed columns plus JSON
//! sub-structures; it is deserialized through [`row_to_session`] and
//! re-validated by the engine on every load, so a partial write is
//! detected instead of trusted. Resolution side effects (budget debit,
//! roster move, owner credit) commit in the same transaction as the
//! session write.

use crate::engine::auction::AuctionOutcome;
use crate::engine::session::MarketSession;
use crate::types::{
    AuctionMode, League, LeaguePhase, Member, MemberFinance, Player, PlayerStatus, Role, RoleSlot,
    SessionState,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Bearer session for an authenticated member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub member_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Audit-log row for admin overrides and phase changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub league_id: i64,
    pub actor_member_id: Option<i64>,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// One listone entry as provided to the seeding CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSeed {
    pub name: String,
    pub team: String,
    pub role: Role,
    pub quotation: i64,
    #[serde(default)]
    pub age: Option<i64>,
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leagues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phase TEXT NOT NULL DEFAULT 'Setup',
                budget_per_member INTEGER NOT NULL,
                slots_goalkeeper INTEGER NOT NULL,
                slots_defender INTEGER NOT NULL,
                slots_midfielder INTEGER NOT NULL,
                slots_forward INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL,
                username TEXT NOT NULL UNIQUE,
                team_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                budget INTEGER NOT NULL CHECK (budget >= 0),
                is_connected INTEGER NOT NULL DEFAULT 0,
                joined_at TEXT NOT NULL,
                FOREIGN KEY (league_id) REFERENCES leagues(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                team TEXT NOT NULL,
                role TEXT NOT NULL,
                quotation INTEGER NOT NULL,
                age INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roster (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL,
                member_id INTEGER NOT NULL,
                player_id INTEGER NOT NULL,
                price INTEGER NOT NULL,
                acquired_at TEXT NOT NULL,
                UNIQUE (league_id, player_id),
                FOREIGN KEY (league_id) REFERENCES leagues(id),
                FOREIGN KEY (member_id) REFERENCES members(id),
                FOREIGN KEY (player_id) REFERENCES players(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS market_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL,
                mode TEXT NOT NULL,
                state TEXT NOT NULL,
                current_role TEXT,
                role_sequence TEXT NOT NULL,
                turn_order TEXT NOT NULL,
                current_turn_index INTEGER NOT NULL,
                auction_timer_seconds INTEGER NOT NULL,
                nomination TEXT,
                ready_members TEXT NOT NULL,
                passed_members TEXT NOT NULL,
                auction TEXT,
                pending_ack TEXT,
                frozen INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (league_id) REFERENCES leagues(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS auth_sessions (
                token TEXT PRIMARY KEY,
                member_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (member_id) REFERENCES members(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL,
                actor_member_id INTEGER,
                action TEXT NOT NULL,
                detail TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (league_id) REFERENCES leagues(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the hot lookups
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_league ON members(league_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_roster_member ON roster(league_id, member_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_league ON market_sessions(league_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_state ON market_sessions(state)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_league ON audit_log(league_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_auth_sessions_expires ON auth_sessions(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        info!("Database initialized");
        Ok(())
    }

    // ==================== LEAGUES ====================

    pub async fn create_league(
        &self,
        name: &str,
        budget_per_member: i64,
        slots: [u32; 4],
    ) -> Result<League> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO leagues (name, phase, budget_per_member, slots_goalkeeper, slots_defender, slots_midfielder, slots_forward, created_at)
            VALUES (?, 'Setup', ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(budget_per_member)
        .bind(slots[0])
        .bind(slots[1])
        .bind(slots[2])
        .bind(slots[3])
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(League {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            phase: LeaguePhase::Setup,
            budget_per_member,
            slots_goalkeeper: slots[0],
            slots_defender: slots[1],
            slots_midfielder: slots[2],
            slots_forward: slots[3],
            created_at: now,
        })
    }

    pub async fn get_league(&self, id: i64) -> Result<Option<League>> {
        let row = sqlx::query("SELECT * FROM leagues WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_league(&r)?)),
            None => Ok(None),
        }
    }

    pub async fn set_league_phase(&self, id: i64, phase: LeaguePhase) -> Result<()> {
        sqlx::query("UPDATE leagues SET phase = ? WHERE id = ?")
            .bind(phase.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== MEMBERS ====================

    pub async fn add_member(
        &self,
        league_id: i64,
        username: &str,
        team_name: &str,
        password_hash: &str,
        is_admin: bool,
        budget: i64,
    ) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO members (league_id, username, team_name, password_hash, is_admin, budget, is_connected, joined_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(league_id)
        .bind(username)
        .bind(team_name)
        .bind(password_hash)
        .bind(is_admin)
        .bind(budget)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_member(&self, id: i64) -> Result<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_member(&r)?)),
            None => Ok(None),
        }
    }

    /// Member plus stored password hash, for login.
    pub async fn get_member_by_username(&self, username: &str) -> Result<Option<(Member, String)>> {
        let row = sqlx::query("SELECT * FROM members WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let hash: String = r.get("password_hash");
                Ok(Some((row_to_member(&r)?, hash)))
            }
            None => Ok(None),
        }
    }

    pub async fn league_members(&self, league_id: i64) -> Result<Vec<Member>> {
        let rows = sqlx::query("SELECT * FROM members WHERE league_id = ? ORDER BY id")
            .bind(league_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_member).collect()
    }

    pub async fn set_member_connected(&self, id: i64, connected: bool) -> Result<()> {
        sqlx::query("UPDATE members SET is_connected = ? WHERE id = ?")
            .bind(connected)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Committed budget and role-slot fill for one member, read for the
    /// bid-legality check.
    pub async fn member_finance(
        &self,
        league_id: i64,
        member_id: i64,
        role: Role,
        total_slots: u32,
    ) -> Result<MemberFinance> {
        let budget: (i64,) = sqlx::query_as("SELECT budget FROM members WHERE id = ?")
            .bind(member_id)
            .fetch_one(&self.pool)
            .await?;

        let filled: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM roster r
            JOIN players p ON p.id = r.player_id
            WHERE r.league_id = ? AND r.member_id = ? AND p.role = ?
            "#,
        )
        .bind(league_id)
        .bind(member_id)
        .bind(role.letter())
        .fetch_one(&self.pool)
        .await?;

        Ok(MemberFinance {
            budget: budget.0,
            slot: RoleSlot {
                filled: filled.0 as u32,
                total: total_slots,
            },
        })
    }

    /// Number of members that still have open slots for the given role.
    /// Zero means the role is complete across the league.
    pub async fn members_missing_role_slots(
        &self,
        league_id: i64,
        role: Role,
        total_slots: u32,
    ) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM members m
            WHERE m.league_id = ?
              AND (SELECT COUNT(*) FROM roster r
                   JOIN players p ON p.id = r.player_id
                   WHERE r.league_id = m.league_id AND r.member_id = m.id AND p.role = ?) < ?
            "#,
        )
        .bind(league_id)
        .bind(role.letter())
        .bind(total_slots)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    // ==================== PLAYERS / ROSTER ====================

    pub async fn seed_players(&self, players: &[PlayerSeed]) -> Result<u64> {
        let mut inserted = 0u64;
        for seed in players {
            sqlx::query(
                "INSERT INTO players (name, team, role, quotation, age) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&seed.name)
            .bind(&seed.team)
            .bind(seed.role.letter())
            .bind(seed.quotation)
            .bind(seed.age)
            .execute(&self.pool)
            .await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub async fn get_player(&self, id: i64) -> Result<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_player(&r)?)),
            None => Ok(None),
        }
    }

    /// Player plus its ownership within a league.
    pub async fn player_status(
        &self,
        league_id: i64,
        player_id: i64,
    ) -> Result<Option<PlayerStatus>> {
        let player = match self.get_player(player_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let owner: Option<(i64,)> =
            sqlx::query_as("SELECT member_id FROM roster WHERE league_id = ? AND player_id = ?")
                .bind(league_id)
                .bind(player_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(Some(PlayerStatus {
            player,
            owner: owner.map(|(id,)| id),
        }))
    }

    pub async fn member_roster(
        &self,
        league_id: i64,
        member_id: i64,
    ) -> Result<Vec<(Player, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT p.*, r.price FROM roster r
            JOIN players p ON p.id = r.player_id
            WHERE r.league_id = ? AND r.member_id = ?
            ORDER BY p.role, p.quotation DESC
            "#,
        )
        .bind(league_id)
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let price: i64 = r.get("price");
                Ok((row_to_player(r)?, price))
            })
            .collect()
    }

    // ==================== MARKET SESSIONS ====================

    pub async fn create_market_session(&self, session: &MarketSession) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO market_sessions
                (league_id, mode, state, current_role, role_sequence, turn_order,
                 current_turn_index, auction_timer_seconds, nomination, ready_members,
                 passed_members, auction, pending_ack, frozen, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.league_id)
        .bind(session.mode.as_str())
        .bind(session.state.as_str())
        .bind(session.current_role.map(|r| r.letter()))
        .bind(serde_json::to_string(&session.role_sequence)?)
        .bind(serde_json::to_string(&session.turn_order)?)
        .bind(session.current_turn_index as i64)
        .bind(session.auction_timer_seconds)
        .bind(opt_json(&session.nomination)?)
        .bind(serde_json::to_string(&session.ready_members)?)
        .bind(serde_json::to_string(&session.passed_members)?)
        .bind(opt_json(&session.auction)?)
        .bind(opt_json(&session.pending_ack)?)
        .bind(session.frozen)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn load_session(&self, id: i64) -> Result<Option<MarketSession>> {
        let row = sqlx::query("SELECT * FROM market_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_session(&r)?)),
            None => Ok(None),
        }
    }

    /// Most recent session for a league, if any.
    pub async fn find_league_session(&self, league_id: i64) -> Result<Option<MarketSession>> {
        let row = sqlx::query(
            "SELECT * FROM market_sessions WHERE league_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(league_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_session(&r)?)),
            None => Ok(None),
        }
    }

    pub async fn save_session(&self, session: &MarketSession) -> Result<()> {
        save_session_on(&self.pool, session).await
    }

    /// Sessions currently in the bidding state; the expiry watcher polls
    /// these and lets the engine decide expiry under the session lock.
    pub async fn sessions_in_bidding(&self) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM market_sessions WHERE state = 'Bidding' AND frozen = 0",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Commit an auction resolution atomically: budget debit, roster
    /// move (plus owner release and credit for a steal) and the session
    /// write all land in one transaction, or none of them do.
    pub async fn commit_resolution(
        &self,
        session: &MarketSession,
        outcome: &AuctionOutcome,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(winner) = &outcome.winner {
            if session.mode == AuctionMode::Rubata {
                let previous: Option<(i64, i64)> = sqlx::query_as(
                    "SELECT id, member_id FROM roster WHERE league_id = ? AND player_id = ?",
                )
                .bind(session.league_id)
                .bind(outcome.player_id)
                .fetch_optional(&mut *tx)
                .await?;

                if let Some((row_id, owner_id)) = previous {
                    sqlx::query("DELETE FROM roster WHERE id = ?")
                        .bind(row_id)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query("UPDATE members SET budget = budget + ? WHERE id = ?")
                        .bind(winner.amount)
                        .bind(owner_id)
                        .execute(&mut *tx)
                        .await?;
                }
            }

            let debit =
                sqlx::query("UPDATE members SET budget = budget - ? WHERE id = ? AND budget >= ?")
                    .bind(winner.amount)
                    .bind(winner.member_id)
                    .bind(winner.amount)
                    .execute(&mut *tx)
                    .await?;
            if debit.rows_affected() == 0 {
                return Err(anyhow!(
                    "budget debit of {} failed for member {}",
                    winner.amount,
                    winner.member_id
                ));
            }

            sqlx::query(
                "INSERT INTO roster (league_id, member_id, player_id, price, acquired_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(session.league_id)
            .bind(winner.member_id)
            .bind(outcome.player_id)
            .bind(winner.amount)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        save_session_on(&mut *tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== AUTH SESSIONS ====================

    pub async fn create_auth_session(&self, member_id: i64) -> Result<AuthSession> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(24);

        sqlx::query(
            "INSERT INTO auth_sessions (token, member_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(member_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            member_id,
            created_at: now,
            expires_at,
        })
    }

    /// Validate and get an auth session; expired tokens are deleted on
    /// touch.
    pub async fn get_auth_session(&self, token: &str) -> Result<Option<AuthSession>> {
        let row = sqlx::query("SELECT * FROM auth_sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let created_at_str: String = r.get("created_at");
                let expires_at_str: String = r.get("expires_at");
                let expires_at = parse_datetime(&expires_at_str)?;

                if expires_at < Utc::now() {
                    self.delete_auth_session(token).await?;
                    return Ok(None);
                }

                Ok(Some(AuthSession {
                    token: r.get("token"),
                    member_id: r.get("member_id"),
                    created_at: parse_datetime(&created_at_str)?,
                    expires_at,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_auth_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== AUDIT ====================

    pub async fn record_audit(
        &self,
        league_id: i64,
        actor_member_id: Option<i64>,
        action: &str,
        detail: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO audit_log (league_id, actor_member_id, action, detail, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(league_id)
        .bind(actor_member_id)
        .bind(action)
        .bind(detail)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_audit(&self, league_id: i64, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows =
            sqlx::query("SELECT * FROM audit_log WHERE league_id = ? ORDER BY id DESC LIMIT ?")
                .bind(league_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|r| {
                let created_at_str: String = r.get("created_at");
                Ok(AuditEntry {
                    id: r.get("id"),
                    league_id: r.get("league_id"),
                    actor_member_id: r.get("actor_member_id"),
                    action: r.get("action"),
                    detail: r.get("detail"),
                    created_at: parse_datetime(&created_at_str)?,
                })
            })
            .collect()
    }
}

// ==================== ROW MAPPING ====================

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid timestamp {s}"))?
        .with_timezone(&Utc))
}

fn parse_role(s: &str) -> Result<Role> {
    Role::from_letter(s).ok_or_else(|| anyhow!("unknown role {s}"))
}

fn opt_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>> {
    match value {
        Some(v) => Ok(Some(serde_json::to_string(v)?)),
        None => Ok(None),
    }
}

fn row_to_league(row: &sqlx::sqlite::SqliteRow) -> Result<League> {
    let phase_str: String = row.get("phase");
    let created_at_str: String = row.get("created_at");
    let slots_goalkeeper: i64 = row.get("slots_goalkeeper");
    let slots_defender: i64 = row.get("slots_defender");
    let slots_midfielder: i64 = row.get("slots_midfielder");
    let slots_forward: i64 = row.get("slots_forward");

    Ok(League {
        id: row.get("id"),
        name: row.get("name"),
        phase: LeaguePhase::parse(&phase_str)
            .ok_or_else(|| anyhow!("unknown league phase {phase_str}"))?,
        budget_per_member: row.get("budget_per_member"),
        slots_goalkeeper: slots_goalkeeper as u32,
        slots_defender: slots_defender as u32,
        slots_midfielder: slots_midfielder as u32,
        slots_forward: slots_forward as u32,
        created_at: parse_datetime(&created_at_str)?,
    })
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<Member> {
    let joined_at_str: String = row.get("joined_at");

    Ok(Member {
        id: row.get("id"),
        league_id: row.get("league_id"),
        username: row.get("username"),
        team_name: row.get("team_name"),
        is_admin: row.get("is_admin"),
        budget: row.get("budget"),
        is_connected: row.get("is_connected"),
        joined_at: parse_datetime(&joined_at_str)?,
    })
}

fn row_to_player(row: &sqlx::sqlite::SqliteRow) -> Result<Player> {
    let role_str: String = row.get("role");

    Ok(Player {
        id: row.get("id"),
        name: row.get("name"),
        team: row.get("team"),
        role: parse_role(&role_str)?,
        quotation: row.get("quotation"),
        age: row.get("age"),
    })
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<MarketSession> {
    let mode_str: String = row.get("mode");
    let state_str: String = row.get("state");
    let current_role: Option<String> = row.get("current_role");
    let role_sequence_str: String = row.get("role_sequence");
    let turn_order_str: String = row.get("turn_order");
    let current_turn_index: i64 = row.get("current_turn_index");
    let nomination: Option<String> = row.get("nomination");
    let ready_members_str: String = row.get("ready_members");
    let passed_members_str: String = row.get("passed_members");
    let auction: Option<String> = row.get("auction");
    let pending_ack: Option<String> = row.get("pending_ack");

    Ok(MarketSession {
        id: row.get("id"),
        league_id: row.get("league_id"),
        mode: AuctionMode::parse(&mode_str)
            .ok_or_else(|| anyhow!("unknown auction mode {mode_str}"))?,
        state: SessionState::parse(&state_str)
            .ok_or_else(|| anyhow!("unknown session state {state_str}"))?,
        current_role: current_role.as_deref().map(parse_role).transpose()?,
        role_sequence: serde_json::from_str(&role_sequence_str)
            .context("invalid role_sequence column")?,
        turn_order: serde_json::from_str(&turn_order_str).context("invalid turn_order column")?,
        current_turn_index: current_turn_index as usize,
        auction_timer_seconds: row.get("auction_timer_seconds"),
        nomination: nomination
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("invalid nomination column")?,
        ready_members: serde_json::from_str(&ready_members_str)
            .context("invalid ready_members column")?,
        passed_members: serde_json::from_str(&passed_members_str)
            .context("invalid passed_members column")?,
        auction: auction
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("invalid auction column")?,
        pending_ack: pending_ack
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("invalid pending_ack column")?,
        frozen: row.get("frozen"),
    })
}

async fn save_session_on<'e, E>(executor: E, session: &MarketSession) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE market_sessions SET
            mode = ?, state = ?, current_role = ?, role_sequence = ?, turn_order = ?,
            current_turn_index = ?, auction_timer_seconds = ?, nomination = ?,
            ready_members = ?, passed_members = ?, auction = ?, pending_ack = ?,
            frozen = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(session.mode.as_str())
    .bind(session.state.as_str())
    .bind(session.current_role.map(|r| r.letter()))
    .bind(serde_json::to_string(&session.role_sequence)?)
    .bind(serde_json::to_string(&session.turn_order)?)
    .bind(session.current_turn_index as i64)
    .bind(session.auction_timer_seconds)
    .bind(opt_json(&session.nomination)?)
    .bind(serde_json::to_string(&session.ready_members)?)
    .bind(serde_json::to_string(&session.passed_members)?)
    .bind(opt_json(&session.auction)?)
    .bind(opt_json(&session.pending_ack)?)
    .bind(session.frozen)
    .bind(Utc::now().to_rfc3339())
    .bind(session.id)
    .execute(executor)
    .await?;
    Ok(())
}
