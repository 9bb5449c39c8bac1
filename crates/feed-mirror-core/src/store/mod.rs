//! Storage abstraction for Feed Mirror.
//!
//! The [`ArticleStore`] trait defines every storage operation the sync and
//! search pipelines need, so the pipelines run unchanged against SQLite
//! in production and the in-memory store in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ArticleStamp, ArticleUpsert, SearchHit, StoredArticle, UpsertOutcome};
use crate::query::TextQuery;

/// Abstract article store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_stamps`](ArticleStore::list_stamps) | Snapshot of every `(url, published_at)` |
/// | [`delete_by_urls`](ArticleStore::delete_by_urls) | Delete one batch of articles |
/// | [`upsert_article`](ArticleStore::upsert_article) | Create or replace one article and its search vector |
/// | [`search`](ArticleStore::search) | Ranked full-text search |
/// | [`recent`](ArticleStore::recent) | Newest articles first |
/// | [`get_article`](ArticleStore::get_article) | Look up one article by URL |
/// | [`count`](ArticleStore::count) | Number of stored articles |
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Read the complete `(url, published_at)` snapshot.
    async fn list_stamps(&self) -> Result<Vec<ArticleStamp>>;

    /// Delete the articles with these URLs as one unit.
    ///
    /// Returns the number of rows removed. URLs that are not stored are
    /// ignored.
    async fn delete_by_urls(&self, urls: &[String]) -> Result<u64>;

    /// Create or atomically replace the article for `article.url`.
    ///
    /// Title, content, timestamp, and search vector change together or
    /// not at all. Re-upserting identical input reports
    /// [`UpsertOutcome::Unchanged`] and writes nothing.
    async fn upsert_article(&self, article: &ArticleUpsert) -> Result<UpsertOutcome>;

    /// Articles matching `query`, best first, at most `limit`.
    async fn search(&self, query: &TextQuery, limit: usize) -> Result<Vec<SearchHit>>;

    /// The `limit` most recently published articles.
    async fn recent(&self, limit: usize) -> Result<Vec<SearchHit>>;

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>>;

    async fn count(&self) -> Result<u64>;
}
