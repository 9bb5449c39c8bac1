//! `fmirror get`: print one stored article by URL.

use anyhow::{bail, Result};

use feed_mirror_core::models::{format_timestamp, StoredArticle};
use feed_mirror_core::store::ArticleStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub async fn get_article(config: &Config, url: &str) -> Result<Option<StoredArticle>> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let article = store.get_article(url).await;
    pool.close().await;
    article
}

pub async fn run_get(config: &Config, url: &str) -> Result<()> {
    let Some(article) = get_article(config, url).await? else {
        bail!("article not found: {}", url);
    };

    println!("--- Article ---");
    println!("id:        {}", article.id);
    println!("title:     {}", article.title);
    println!("url:       {}", article.url);
    println!("published: {}", format_timestamp(&article.published_at));
    println!();
    println!("--- Content ---");
    println!("{}", article.content);

    Ok(())
}
