//! Database statistics.
//!
//! Used by `fmirror stats` to confirm that syncs are landing: article
//! count, the publication range, the last sync time, and the file size.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Summary of the mirrored articles.
#[derive(Debug, Clone, PartialEq)]
pub struct DbStats {
    pub total: i64,
    pub newest: Option<String>,
    pub oldest: Option<String>,
    /// Unix seconds of the most recent write by a sync run.
    pub last_sync: Option<i64>,
}

/// Open the database, read the summary, and close the pool on every path.
pub async fn database_stats(config: &Config) -> Result<DbStats> {
    let pool = db::connect(config).await?;
    let stats = query_stats(&pool).await;
    pool.close().await;
    stats
}

async fn query_stats(pool: &SqlitePool) -> Result<DbStats> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;

    let (newest, oldest, last_sync): (Option<String>, Option<String>, Option<i64>) =
        sqlx::query_as(
            r#"
            SELECT
                (SELECT published_at FROM articles ORDER BY published_ts DESC LIMIT 1),
                (SELECT published_at FROM articles ORDER BY published_ts ASC LIMIT 1),
                (SELECT MAX(synced_at) FROM articles)
            "#,
        )
        .fetch_one(pool)
        .await?;

    Ok(DbStats {
        total,
        newest,
        oldest,
        last_sync,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let stats = database_stats(config).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Feed Mirror: Database Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Articles:    {}", stats.total);
    println!("  Newest:      {}", stats.newest.as_deref().unwrap_or("-"));
    println!("  Oldest:      {}", stats.oldest.as_deref().unwrap_or("-"));
    println!(
        "  Last sync:   {}",
        stats
            .last_sync
            .map(format_ts_iso)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
