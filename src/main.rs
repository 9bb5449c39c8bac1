//! # Feed Mirror CLI (`fmirror`)
//!
//! ## Usage
//!
//! ```bash
//! fmirror --config ./config/mirror.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fmirror init` | Create the SQLite database and run schema migrations |
//! | `fmirror sync` | Reconcile the store with the remote feed |
//! | `fmirror search "<query>"` | Search mirrored articles |
//! | `fmirror get <url>` | Print one stored article |
//! | `fmirror stats` | Summarize the database |
//! | `fmirror serve` | Start the search HTTP server |
//!
//! Logs go to stderr; set `RUST_LOG` (default `info`) to adjust.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use feed_mirror::{config, get, migrate, search, server, stats, sync};
use feed_mirror_core::reconcile::SyncMode;

/// Feed Mirror: keep a searchable copy of a remote feed.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mirror.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "fmirror",
    about = "Mirror a paginated feed into SQLite and search it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mirror.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Reconcile the store with the remote feed.
    ///
    /// Deletes articles no longer listed, inserts new ones, and updates
    /// those whose feed timestamp is newer than the stored one.
    Sync {
        /// Rewrite every feed item regardless of timestamps.
        #[arg(long)]
        force: bool,

        /// Show what would change without fetching articles or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Search mirrored articles. An empty query lists the newest.
    Search {
        /// Search terms; every term must match.
        #[arg(default_value = "")]
        query: String,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one stored article.
    Get {
        /// Canonical article URL.
        url: String,
    },

    /// Show article counts, publication range, and database size.
    Stats,

    /// Start the search HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync { force, dry_run } => {
            let mode = if force {
                SyncMode::Force
            } else {
                SyncMode::Incremental
            };
            sync::run_sync(&cfg, mode, dry_run).await?;
        }
        Commands::Search { query, json } => {
            search::run_search(&cfg, &query, json).await?;
        }
        Commands::Get { url } => {
            get::run_get(&cfg, &url).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
