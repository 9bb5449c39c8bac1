//! `fmirror search`: run the search pipeline against the local database.

use anyhow::Result;

use feed_mirror_core::models::SearchResult;
use feed_mirror_core::search::search;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Search the configured database and return the result page.
pub async fn search_articles(config: &Config, query: &str) -> Result<Vec<SearchResult>> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let result = search(&store, query, &config.search.params()).await;
    pool.close().await;
    Ok(result?)
}

pub async fn run_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let results = search_articles(config, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let date = result.published_at.get(..10).unwrap_or(&result.published_at);
        println!("{}. [{:.2}] {}", i + 1, result.relevance_rank, result.title);
        println!("    published: {}", date);
        println!("    url: {}", result.url);
        println!(
            "    excerpt: \"{}\"",
            result.snippet.replace('\n', " ").trim()
        );
        println!();
    }

    Ok(())
}
