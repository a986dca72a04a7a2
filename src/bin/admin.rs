//! CLI administration tool for link-redirects.
//!
//! Registers and inspects short links directly against the database, without
//! going through the HTTP surface.
//!
//! # Usage
//!
//! ```bash
//! # Allocate a slug and register a redirect to it
//! cargo run --bin admin -- create https://destination.example/page
//!
//! # Register a redirect from an explicit short URL
//! cargo run --bin admin -- add https://site.example/r/launch https://destination.example/page
//!
//! # List redirects, optionally filtered
//! cargo run --bin admin -- list --filter "to:~'utm_source'"
//!
//! # Print only ids
//! cargo run --bin admin -- ids --filter "to:'https://destination.example/page'"
//!
//! # Allocate an unused short URL without registering it
//! cargo run --bin admin -- slug
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `BASE_URL`, `REDIRECT_URL_PREFIX`, and `DATABASE_URL`
//! (or `DB_*`). `STORAGE=memory` is rejected since nothing would persist.

use link_redirects::application::services::LinkRedirectsService;
use link_redirects::config::{self, Config, StorageBackend};
use link_redirects::domain::event_bus::DomainEvents;
use link_redirects::domain::repositories::{ClickRepository, RedirectFilter};
use link_redirects::infrastructure::persistence::{PgClickRepository, PgLinkRedirectRepository};
use link_redirects::server::connect_database;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;
use url::Url;

/// CLI tool for managing link-redirects.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Allocate a slug and register a redirect to the destination
    Create {
        /// Destination URL
        to: Url,
    },

    /// Register a redirect from an explicit short URL
    Add {
        /// Short URL, usually under BASE_URL + REDIRECT_URL_PREFIX
        from: Url,
        /// Destination URL
        to: Url,
    },

    /// List redirects
    List {
        /// Filter expression, e.g. "to:~'utm_source'"
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print ids of matching redirects, one per line
    Ids {
        /// Filter expression, e.g. "from:'https://site.example/r/ab12cd34'"
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Allocate an unused short URL without registering it
    Slug,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    if config.storage == StorageBackend::Memory {
        anyhow::bail!("The admin tool needs STORAGE=postgres; in-memory redirects live in the server process");
    }

    let pool = connect_database(&config).await?;
    let service = build_service(&config, &pool);

    match cli.command {
        Commands::Create { to } => create_short_link(&service, to).await?,
        Commands::Add { from, to } => add_redirect(&service, from, to).await?,
        Commands::List { filter } => {
            list_redirects(&service, &pool, &parse_filter(filter)?).await?
        }
        Commands::Ids { filter } => print_ids(&service, &parse_filter(filter)?).await?,
        Commands::Slug => {
            let url = service
                .get_slug_url()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to allocate slug: {}", e))?;

            println!("{}", url);
        }
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// The admin tool never resolves requests, so its event bus has no
/// subscribers.
fn build_service(config: &Config, pool: &PgPool) -> LinkRedirectsService {
    let repository = Arc::new(PgLinkRedirectRepository::new(Arc::new(pool.clone())));
    let events = Arc::new(DomainEvents::start(
        config.event_queue_capacity,
        config.event_worker_concurrency,
        Vec::new(),
    ));

    LinkRedirectsService::new(repository, events, config.link_redirects())
}

async fn create_short_link(service: &LinkRedirectsService, to: Url) -> Result<()> {
    let link = service
        .create_short_link(to)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create short link: {}", e))?;

    println!("{}", "✅ Short link created".green().bold());
    println!("  From: {}", link.from.as_str().bright_yellow().bold());
    println!("  To:   {}", link.to.as_str().cyan());
    println!("  ID:   {}", link.id.to_string().bright_black());

    Ok(())
}

/// Registers an explicit redirect. Duplicates are reported, not retried.
async fn add_redirect(service: &LinkRedirectsService, from: Url, to: Url) -> Result<()> {
    if !from.as_str().starts_with(service.base_url().as_str()) {
        println!(
            "{}",
            format!(
                "⚠️  {} is outside {}; requests for it will never reach this service",
                from,
                service.base_url()
            )
            .yellow()
        );
    }

    let link = service.add_redirect(from, to).await.map_err(|e| {
        if e.is_conflict() {
            anyhow::anyhow!("A redirect from this URL already exists")
        } else {
            anyhow::anyhow!("Failed to add redirect: {}", e)
        }
    })?;

    println!("{}", "✅ Redirect added".green().bold());
    println!("  From: {}", link.from.as_str().bright_yellow());
    println!("  To:   {}", link.to.as_str().cyan());

    Ok(())
}

async fn print_ids(service: &LinkRedirectsService, filter: &RedirectFilter) -> Result<()> {
    let ids = service
        .get_filtered_ids(filter)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to query redirects: {}", e))?;

    for id in ids {
        println!("{}", id);
    }

    Ok(())
}

fn parse_filter(expr: Option<String>) -> Result<RedirectFilter> {
    match expr {
        Some(expr) => expr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid filter: {}", e)),
        None => Ok(RedirectFilter::default()),
    }
}

/// Lists redirects with click counts, newest first.
///
/// # Output Format
///
/// ```text
/// 🔗 Redirects
///
///   From                                     To                                       Clicks  Created
///   ──────────────────────────────────────────────────────────────────────────────────────────────────
///   https://site.example/r/ab12cd34          https://destination.example/page         12      2024-01-15 10:30
/// ```
async fn list_redirects(
    service: &LinkRedirectsService,
    pool: &PgPool,
    filter: &RedirectFilter,
) -> Result<()> {
    println!("{}", "🔗 Redirects".bright_blue().bold());
    println!();

    let links = service
        .get_all(filter)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list redirects: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No redirects found".yellow());
        return Ok(());
    }

    let clicks = PgClickRepository::new(Arc::new(pool.clone()));

    println!(
        "  {:<40} {:<40} {:<7} {}",
        "From".bright_white().bold(),
        "To".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Created".bright_white().bold()
    );
    println!("  {}", "─".repeat(106).bright_black());

    for link in &links {
        let count = clicks
            .count_for(link.id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to count clicks: {}", e))?;

        println!(
            "  {:<40} {:<40} {:<7} {}",
            link.from.as_str().cyan(),
            link.to.as_str(),
            count.to_string().bright_green(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black()
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1")
                .fetch_one(pool)
                .await
                .context("Database query failed")?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let redirects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_redirects")
                .fetch_one(pool)
                .await?;
            let clicks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_clicks")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!(
                "  Redirects:  {}",
                redirects.to_string().bright_green().bold()
            );
            println!("  Clicks:     {}", clicks.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
