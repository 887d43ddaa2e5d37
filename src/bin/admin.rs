//! CLI administration tool for slug-links.
//!
//! Works directly against the PostgreSQL store through the same
//! [`LinkService`] the HTTP API uses, so ownership checks and cache
//! invalidation behave identically.
//!
//! # Usage
//!
//! ```bash
//! # List one owner's links
//! cargo run --bin admin -- links list --owner alice
//!
//! # Delete a link (asks for confirmation)
//! cargo run --bin admin -- links delete 42 --owner alice
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` (required): PostgreSQL connection
//! - `REDIS_URL` or `REDIS_*` (optional): cache to invalidate on delete

use slug_links::application::services::LinkService;
use slug_links::config::{Config, mask_connection_string};
use slug_links::domain::entities::LinkRecord;
use slug_links::domain::repositories::LinkStore;
use slug_links::infrastructure::persistence::PgLinkStore;
use slug_links::server::{build_cache, connect_pool};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;

/// CLI tool for managing slug-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and remove links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Show totals across all owners
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List an owner's links, newest first
    List {
        #[arg(short, long)]
        owner: String,
    },

    /// Delete a link and free its slug
    Delete {
        id: i64,

        /// Owner the link must belong to
        #[arg(short, long)]
        owner: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL (or DB_HOST/DB_USER/DB_PASSWORD/DB_NAME) must be set")?;

    let pool = connect_pool(&config, &database_url).await?;
    let store = Arc::new(PgLinkStore::new(Arc::new(pool)));

    let result = match cli.command {
        Commands::Links { action } => {
            let service = LinkService::new(Arc::clone(&store), build_cache(&config).await);
            handle_links_action(action, &service).await
        }
        Commands::Stats => handle_stats(store.as_ref()).await,
        Commands::Db { action } => handle_db_action(action, store.as_ref(), &database_url).await,
    };

    store.close().await;
    result
}

async fn handle_links_action(action: LinksAction, service: &LinkService<PgLinkStore>) -> Result<()> {
    match action {
        LinksAction::List { owner } => list_links(service, &owner).await,
        LinksAction::Delete { id, owner, yes } => delete_link(service, id, &owner, yes).await,
    }
}

/// Prints an owner's links.
///
/// ```text
/// Links of alice
///
///   ID     Slug                 Hits     Created           Target
///   ──────────────────────────────────────────────────────────────────────────
///   42     spring-sale          1031     2025-03-01 09:12  https://example.com/sale
/// ```
async fn list_links(service: &LinkService<PgLinkStore>, owner: &str) -> Result<()> {
    println!("{} {}", "Links of".bright_blue().bold(), owner.cyan().bold());
    println!();

    let links = service
        .list_links(owner)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<6} {:<20} {:<8} {:<17} {}",
        "ID".bright_white().bold(),
        "Slug".bright_white().bold(),
        "Hits".bright_white().bold(),
        "Created".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(76).bright_black());

    for link in &links {
        print_link_row(link);
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

fn print_link_row(link: &LinkRecord) {
    println!(
        "  {:<6} {:<20} {:<8} {:<17} {}",
        link.id.to_string().bright_black(),
        link.slug.as_str().cyan(),
        link.hit_count.to_string().green(),
        link.created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black(),
        link.target_url
    );
}

/// Deletes a link after confirmation (default: No).
async fn delete_link(
    service: &LinkService<PgLinkStore>,
    id: i64,
    owner: &str,
    skip_confirm: bool,
) -> Result<()> {
    let link = service
        .get_link(owner, id)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot delete link {}: {}", id, e))?;

    println!("  Slug:   {}", link.slug.as_str().cyan());
    println!("  Target: {}", link.target_url);
    println!("  Hits:   {}", link.hit_count.to_string().green());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    service
        .delete_link(owner, id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

    println!(
        "{} {}",
        "Deleted, slug is free again:".green().bold(),
        link.slug.as_str().cyan()
    );

    Ok(())
}

/// Displays totals across all owners.
async fn handle_stats(store: &PgLinkStore) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let stats = store
        .stats()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    println!("  Links: {}", stats.links.to_string().bright_green().bold());
    println!("  Hits:  {}", stats.hits.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, store: &PgLinkStore, database_url: &str) -> Result<()> {
    match action {
        DbAction::Check => {
            println!(
                "{} {}",
                "Checking".bright_blue(),
                mask_connection_string(database_url)
            );

            if !store.health_check().await {
                anyhow::bail!("Database is unreachable");
            }

            println!("{}", "Database connection OK".green().bold());
        }
    }

    Ok(())
}
