//! Core data models used throughout Feed Mirror.
//!
//! These types represent the feed entries, stored articles, write payloads,
//! and search results that flow through the sync and search pipelines.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::fold::fold_text;

/// One entry of the remote feed, validated at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub url: String,
    pub title: String,
    pub published_at: DateTime<FixedOffset>,
}

/// The `(url, published_at)` projection of a stored article used for diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStamp {
    pub url: String,
    pub published_at: DateTime<FixedOffset>,
}

/// Write payload for [`ArticleStore::upsert_article`](crate::store::ArticleStore::upsert_article).
#[derive(Debug, Clone)]
pub struct ArticleUpsert {
    pub url: String,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<FixedOffset>,
}

impl ArticleUpsert {
    pub fn from_feed_item(item: &FeedItem, content: String) -> Self {
        Self {
            url: item.url.clone(),
            title: item.title.clone(),
            content,
            published_at: item.published_at,
        }
    }

    /// SHA-256 over title, content, and timestamp.
    ///
    /// Stores compare this against the stored hash so that re-upserting
    /// identical input leaves the row untouched.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.content.as_bytes());
        hasher.update([0u8]);
        hasher.update(format_timestamp(&self.published_at).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn search_vector(&self) -> SearchVector {
        SearchVector::build(&self.title, &self.content)
    }
}

/// Index-ready text derived from an article's title and content.
///
/// Always rebuilt from the current title and content; stores write it in
/// the same transaction as the row it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchVector {
    pub title: String,
    pub content: String,
}

impl SearchVector {
    pub fn build(title: &str, content: &str) -> Self {
        Self {
            title: fold_text(title),
            content: fold_text(content),
        }
    }
}

/// Full stored article as returned by the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredArticle {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<FixedOffset>,
}

/// What a single upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The stored row already had the same content hash.
    Unchanged,
}

/// A row returned by a store search or recent listing.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub published_at: DateTime<FixedOffset>,
    /// Store-specific relevance, higher is better. `0.0` for recent listings.
    pub rank: f64,
}

/// A search result in the shape served to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    /// Excerpt with matched words wrapped in `<strong>` markers.
    pub snippet: String,
    /// RFC 3339 with the original offset.
    pub published_at: String,
    pub relevance_rank: f64,
}

/// Format a timestamp as RFC 3339, keeping its offset.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
