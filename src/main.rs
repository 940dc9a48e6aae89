//! Fantasta admin CLI
//!
//! Operator tooling for the auction server: create leagues, register
//! members, seed the listone, open market sessions and inspect state.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fantasta::auth::hash_password;
use fantasta::db::PlayerSeed;
use fantasta::types::Role;
use fantasta::{AuctionEngine, AuctionMode, Config, Database, Notifier};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fantasta")]
#[command(about = "Admin CLI for the fantacalcio auction server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new league
    CreateLeague {
        /// League name
        #[arg(short, long)]
        name: String,

        /// Starting budget per member, in whole credits
        #[arg(short, long, default_value = "500")]
        budget: i64,

        /// Roster slots as P,D,C,A (e.g. 3,8,8,6)
        #[arg(short, long, default_value = "3,8,8,6")]
        slots: String,
    },

    /// Register a member (DG) in a league
    AddMember {
        #[arg(short, long)]
        league: i64,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        team: String,

        #[arg(short, long)]
        password: String,

        /// Grant league-admin rights
        #[arg(long)]
        admin: bool,
    },

    /// Seed the listone from a JSON file
    SeedPlayers {
        /// JSON array of {name, team, role, quotation, age?}
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Open a market session for a league
    OpenMarket {
        #[arg(short, long)]
        league: i64,

        /// FirstMarket, Rubata or Svincolati
        #[arg(short, long, default_value = "FirstMarket")]
        mode: String,

        /// Acting admin username
        #[arg(short, long)]
        admin: String,

        /// Explicit nomination order as member ids (shuffled if omitted)
        #[arg(short, long)]
        order: Option<String>,
    },

    /// Show the live state of a market session
    Session {
        #[arg(short, long)]
        id: i64,
    },

    /// Show league budgets, roster fill and recent audit entries
    Stats {
        #[arg(short, long)]
        league: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::CreateLeague { name, budget, slots } => {
            create_league(&config, &name, budget, &slots).await?
        }
        Commands::AddMember {
            league,
            username,
            team,
            password,
            admin,
        } => add_member(&config, league, &username, &team, &password, admin).await?,
        Commands::SeedPlayers { file } => seed_players(&config, &file).await?,
        Commands::OpenMarket {
            league,
            mode,
            admin,
            order,
        } => open_market(&config, league, &mode, &admin, order.as_deref()).await?,
        Commands::Session { id } => show_session(&config, id).await?,
        Commands::Stats { league } => show_stats(&config, league).await?,
    }

    Ok(())
}

fn parse_slots(s: &str) -> Result<[u32; 4]> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| anyhow!("slots must be four numbers, e.g. 3,8,8,6"))?;
    if parts.len() != 4 {
        return Err(anyhow!("slots must be four numbers (P,D,C,A)"));
    }
    Ok([parts[0], parts[1], parts[2], parts[3]])
}

async fn create_league(config: &Config, name: &str, budget: i64, slots: &str) -> Result<()> {
    let slots = parse_slots(slots)?;
    let db = Database::new(&config.database_path).await?;
    let league = db.create_league(name, budget, slots).await?;

    println!(
        "Created league {} ({}) with {} credits per member, slots P{} D{} C{} A{}",
        league.id.to_string().bold(),
        league.name,
        budget,
        slots[0],
        slots[1],
        slots[2],
        slots[3]
    );
    Ok(())
}

async fn add_member(
    config: &Config,
    league_id: i64,
    username: &str,
    team: &str,
    password: &str,
    admin: bool,
) -> Result<()> {
    let db = Database::new(&config.database_path).await?;
    let league = db
        .get_league(league_id)
        .await?
        .ok_or_else(|| anyhow!("league {league_id} not found"))?;

    let password_hash = hash_password(password)?;
    let member_id = db
        .add_member(
            league_id,
            username,
            team,
            &password_hash,
            admin,
            league.budget_per_member,
        )
        .await?;

    println!(
        "Added member {} ({}) to league {} with id {}{}",
        username.bold(),
        team,
        league.name,
        member_id,
        if admin { " [admin]" } else { "" }
    );
    Ok(())
}

async fn seed_players(config: &Config, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let seeds: Vec<PlayerSeed> = serde_json::from_str(&raw)?;

    let db = Database::new(&config.database_path).await?;
    let inserted = db.seed_players(&seeds).await?;

    println!("Seeded {} players from {}", inserted, file.display());
    Ok(())
}

async fn open_market(
    config: &Config,
    league_id: i64,
    mode: &str,
    admin_username: &str,
    order: Option<&str>,
) -> Result<()> {
    let mode = AuctionMode::parse(mode)
        .ok_or_else(|| anyhow!("mode must be FirstMarket, Rubata or Svincolati"))?;
    let explicit_order = match order {
        Some(s) => Some(
            s.split(',')
                .map(|p| p.trim().parse())
                .collect::<Result<Vec<i64>, _>>()
                .map_err(|_| anyhow!("order must be comma-separated member ids"))?,
        ),
        None => None,
    };

    let db = Arc::new(Database::new(&config.database_path).await?);
    let (admin, _) = db
        .get_member_by_username(admin_username)
        .await?
        .ok_or_else(|| anyhow!("member {admin_username} not found"))?;

    let notifier = Arc::new(Notifier::new(None));
    let engine = AuctionEngine::new(db, notifier, config.auction_timer_seconds);

    let snapshot = engine
        .open_market(league_id, mode, explicit_order, &admin)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    println!(
        "Opened {} session {} for league {}",
        mode.to_string().bold(),
        snapshot.session_id,
        league_id
    );
    println!(
        "Nomination order: {}",
        snapshot
            .turn_order
            .iter()
            .map(|m| m.username.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    Ok(())
}

async fn show_session(config: &Config, session_id: i64) -> Result<()> {
    let db = Arc::new(Database::new(&config.database_path).await?);
    let notifier = Arc::new(Notifier::new(None));
    let engine = AuctionEngine::new(db, notifier, config.auction_timer_seconds);

    let snapshot = engine
        .snapshot(session_id, None)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    println!("\n{}", "=".repeat(70));
    println!(
        "  SESSION {} | league {} | {} | {}",
        snapshot.session_id,
        snapshot.league_id,
        snapshot.mode,
        snapshot.state.as_str().bold()
    );
    if snapshot.frozen {
        println!("  {}", "FROZEN - awaiting admin repair".red().bold());
    }
    println!("{}", "=".repeat(70));

    if let Some(role) = snapshot.current_role {
        println!("  Board role:   {}", role);
    }
    println!("  Current turn: {}", snapshot.current_turn.username.bold());

    if let Some(ready) = &snapshot.ready {
        println!(
            "\n  Nomination: {} by {} ({})",
            ready.player.name.bold(),
            ready.nominator_username,
            if ready.nominator_confirmed {
                "confirmed"
            } else {
                "unconfirmed"
            }
        );
        println!(
            "  Ready: {}/{} | waiting on: {}",
            ready.ready_count,
            ready.total_members,
            ready
                .pending_members
                .iter()
                .map(|m| m.username.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let Some(auction) = &snapshot.auction {
        println!(
            "\n  On the block: {} ({}, {})",
            auction.player.name.bold(),
            auction.player.role,
            auction.player.team
        );
        println!(
            "  Price: {} (base {}) | {}s remaining",
            auction.current_price.to_string().green().bold(),
            auction.base_price,
            auction.remaining_seconds
        );
        for bid in auction.bids.iter().take(5) {
            println!("    {} bid {}", bid.bidder.username, bid.amount);
        }
    }

    if let Some(ack) = &snapshot.ack {
        match &ack.winner {
            Some(winner) => println!(
                "\n  Resolution: {} to {} for {}",
                ack.player.name.bold(),
                winner.username,
                ack.final_price
            ),
            None => println!("\n  Resolution: {} unsold", ack.player.name.bold()),
        }
        println!(
            "  Acknowledged: {}/{} | waiting on: {}",
            ack.total_acknowledged,
            ack.total_members,
            ack.pending_members
                .iter()
                .map(|m| m.username.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!();
    Ok(())
}

async fn show_stats(config: &Config, league_id: i64) -> Result<()> {
    let db = Database::new(&config.database_path).await?;
    let league = db
        .get_league(league_id)
        .await?
        .ok_or_else(|| anyhow!("league {league_id} not found"))?;
    let members = db.league_members(league_id).await?;

    println!("\n{}", "=".repeat(70));
    println!("  {} | phase: {}", league.name.bold(), league.phase);
    println!("{}\n", "=".repeat(70));

    for member in &members {
        let mut fills = Vec::new();
        for role in Role::SEQUENCE {
            let finance = db
                .member_finance(league_id, member.id, role, league.slots_for(role))
                .await?;
            fills.push(format!("{}{}/{}", role, finance.slot.filled, finance.slot.total));
        }
        println!(
            "  {:<16} {:<20} budget {:>4} | {}",
            member.username.bold(),
            member.team_name,
            member.budget.to_string().green(),
            fills.join(" ")
        );
        let roster = db.member_roster(league_id, member.id).await?;
        for (player, price) in roster.iter().take(5) {
            println!("      {} {} ({}) - {}", player.role, player.name, player.team, price);
        }
        if roster.len() > 5 {
            println!("      ... and {} more", roster.len() - 5);
        }
    }

    let audit = db.recent_audit(league_id, 10).await?;
    if !audit.is_empty() {
        println!("\n  Recent admin actions:");
        for entry in audit {
            println!(
                "    {} {} {}",
                entry.created_at.format("%m-%d %H:%M"),
                entry.action.yellow(),
                entry.detail
            );
        }
    }

    println!();
    Ok(())
}
