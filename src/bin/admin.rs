//! CLI administration tool for waste-exchange.
//!
//! Inspects and clears rate limit counters, mints access tokens for support
//! work, and checks the database, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show rate limit counters for a client IP
//! cargo run --bin admin -- limits show 203.0.113.7
//!
//! # Clear one tier (or every tier) for a client IP
//! cargo run --bin admin -- limits reset 203.0.113.7 --tier login
//!
//! # Issue an access token for user 42
//! cargo run --bin admin -- token issue 42
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `waste_exchange::config`). `limits` needs Redis;
//! in-process counters live inside the server and cannot be reached from here.

use waste_exchange::application::services::AuthService;
use waste_exchange::config::{self, Config};
use waste_exchange::domain::rate_limit::Tier;
use waste_exchange::domain::repositories::UserRepository;
use waste_exchange::infrastructure::counter::{CounterStore, RedisCounterStore};
use waste_exchange::infrastructure::persistence::PgUserRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing waste-exchange.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or clear rate limit counters
    Limits {
        #[command(subcommand)]
        action: LimitsAction,
    },

    /// Access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LimitsAction {
    /// Show every tier's counter for a client
    Show {
        /// Client identity (IP address)
        identity: String,
    },

    /// Clear counters for a client
    Reset {
        /// Client identity (IP address)
        identity: String,

        /// Only this tier: general, login or account_creation
        #[arg(short, long)]
        tier: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for a user, with the user's stored role
    Issue {
        /// User id
        user_id: i64,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show row counts
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    match cli.command {
        Commands::Limits { action } => handle_limits_action(action, &config).await?,
        Commands::Token { action } => handle_token_action(action, &config).await?,
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

async fn connect_redis(config: &Config) -> Result<RedisCounterStore> {
    let redis_url = config
        .redis_url
        .as_deref()
        .context("REDIS_URL (or REDIS_HOST) must be set; in-process counters are not reachable")?;

    RedisCounterStore::connect(redis_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))
}

async fn connect_db(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

fn parse_tier(value: &str) -> Result<Tier> {
    Tier::parse(value).with_context(|| {
        format!("Unknown tier '{value}', expected general, login or account_creation")
    })
}

async fn handle_limits_action(action: LimitsAction, config: &Config) -> Result<()> {
    let store = connect_redis(config).await?;
    let rules = config.rate_limit_rules();

    match action {
        LimitsAction::Show { identity } => {
            println!(
                "{} {}",
                "📊 Rate limits for".bright_blue().bold(),
                identity.cyan()
            );
            println!();
            println!(
                "  {:<18} {:<10} {:<10} {:<12}",
                "Tier".bright_white().bold(),
                "Used".bright_white().bold(),
                "Limit".bright_white().bold(),
                "Resets in".bright_white().bold()
            );
            println!("  {}", "─".repeat(54).bright_black());

            for tier in Tier::ALL {
                let rule = rules.rule(tier);
                let snapshot = store
                    .peek(&rule.key_for(&identity))
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read counter: {}", e))?;

                let (used, resets) = match snapshot {
                    Some(s) => (s.count, format!("{}s", s.reset_after.as_secs())),
                    None => (0, "-".to_string()),
                };

                let used_text = if used >= u64::from(rule.max_requests) {
                    used.to_string().red().bold()
                } else {
                    used.to_string().green()
                };

                println!(
                    "  {:<18} {:<10} {:<10} {}",
                    tier.as_str().cyan(),
                    used_text,
                    rule.max_requests,
                    resets.bright_black()
                );
            }
            println!();
        }
        LimitsAction::Reset {
            identity,
            tier,
            yes,
        } => {
            let tiers = match tier {
                Some(t) => vec![parse_tier(&t)?],
                None => Tier::ALL.to_vec(),
            };

            println!("{}", "🧹 Reset rate limits".bright_blue().bold());
            println!();
            println!("  Client: {}", identity.cyan());
            println!(
                "  Tiers:  {}",
                tiers
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Clear these counters?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            for tier in tiers {
                store
                    .reset(&rules.rule(tier).key_for(&identity))
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to reset {}: {}", tier, e))?;
            }

            println!("{}", "✅ Counters cleared".green().bold());
        }
    }

    Ok(())
}

async fn handle_token_action(action: TokenAction, config: &Config) -> Result<()> {
    let pool = connect_db(config).await?;
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(Arc::new(pool)));

    match action {
        TokenAction::Issue { user_id } => {
            let user = users
                .find_by_id(user_id)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .with_context(|| format!("User {user_id} not found"))?;

            let auth = AuthService::new(
                users.clone(),
                &config.jwt_secret,
                Duration::from_secs(config.jwt_ttl_seconds),
                Duration::from_millis(config.user_lookup_timeout_ms),
                1,
            );

            let token = auth
                .issue_token(&user)
                .map_err(|e| anyhow::anyhow!("Failed to issue token: {}", e))?;

            println!("{}", "🔑 Access token issued".bright_blue().bold());
            println!();
            println!("  User:    {} <{}>", user.name.cyan(), user.email);
            println!("  Role:    {}", user.role.as_str().cyan());
            println!("  Expires: in {}s", config.jwt_ttl_seconds);
            println!();
            println!("  {}", token.bright_yellow());
            println!();
            println!(
                "  curl -H \"Authorization: Bearer {}\" http://{}/api/users/me",
                token.bright_yellow(),
                config.listen_addr
            );
            println!();
        }
    }

    Ok(())
}

async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    let pool = connect_db(config).await?;

    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(&pool)
                .await?;
            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&pool)
                .await?;
            let listings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waste_listings")
                .fetch_one(&pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Users:      {}", users.to_string().bright_green().bold());
            println!("  Listings:   {}", listings.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
