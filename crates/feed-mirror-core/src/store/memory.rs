//! In-memory [`ArticleStore`] implementation for tests and embedding.
//!
//! Articles live in a `BTreeMap` keyed by URL behind `std::sync::RwLock`.
//! The search vector is kept as folded word counts per article and is
//! rebuilt inside the same write lock as the row it describes. Ranking is
//! weighted term frequency (title words count double).

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::fold::words;
use crate::models::{
    ArticleStamp, ArticleUpsert, SearchHit, SearchVector, StoredArticle, UpsertOutcome,
};
use crate::query::TextQuery;

use super::ArticleStore;

const TITLE_WEIGHT: f64 = 2.0;

struct StoredRow {
    article: StoredArticle,
    content_hash: String,
    title_words: HashMap<String, usize>,
    content_words: HashMap<String, usize>,
}

impl StoredRow {
    fn to_hit(&self, rank: f64) -> SearchHit {
        SearchHit {
            id: self.article.id.clone(),
            title: self.article.title.clone(),
            url: self.article.url.clone(),
            content: self.article.content.clone(),
            published_at: self.article.published_at,
            rank,
        }
    }

    fn rank(&self, query: &TextQuery) -> Option<f64> {
        let present = |t: &str| self.title_words.contains_key(t) || self.content_words.contains_key(t);
        if !query.matches(present) {
            return None;
        }
        let score = query
            .terms()
            .iter()
            .map(|t| {
                let in_title = self.title_words.get(t).copied().unwrap_or(0) as f64;
                let in_content = self.content_words.get(t).copied().unwrap_or(0) as f64;
                TITLE_WEIGHT * in_title + in_content
            })
            .sum();
        Some(score)
    }
}

fn word_counts(folded: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for w in words(folded) {
        *counts.entry(w.to_string()).or_insert(0) += 1;
    }
    counts
}

/// In-memory store for tests and single-process embedding.
pub struct InMemoryStore {
    rows: RwLock<BTreeMap<String, StoredRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, StoredRow>>> {
        self.rows.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoredRow>>> {
        self.rows.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(a: &SearchHit, b: &SearchHit) -> std::cmp::Ordering {
    b.published_at.cmp(&a.published_at).then(a.url.cmp(&b.url))
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn list_stamps(&self) -> Result<Vec<ArticleStamp>> {
        let rows = self.read()?;
        Ok(rows
            .values()
            .map(|r| ArticleStamp {
                url: r.article.url.clone(),
                published_at: r.article.published_at,
            })
            .collect())
    }

    async fn delete_by_urls(&self, urls: &[String]) -> Result<u64> {
        let mut rows = self.write()?;
        let removed = urls.iter().filter(|u| rows.remove(*u).is_some()).count();
        Ok(removed as u64)
    }

    async fn upsert_article(&self, article: &ArticleUpsert) -> Result<UpsertOutcome> {
        let hash = article.content_hash();
        let mut rows = self.write()?;

        let (id, outcome) = match rows.get(&article.url) {
            Some(existing) if existing.content_hash == hash => {
                return Ok(UpsertOutcome::Unchanged);
            }
            Some(existing) => (existing.article.id.clone(), UpsertOutcome::Updated),
            None => (Uuid::new_v4().to_string(), UpsertOutcome::Inserted),
        };

        let SearchVector { title, content } = article.search_vector();
        rows.insert(
            article.url.clone(),
            StoredRow {
                article: StoredArticle {
                    id,
                    url: article.url.clone(),
                    title: article.title.clone(),
                    content: article.content.clone(),
                    published_at: article.published_at,
                },
                content_hash: hash,
                title_words: word_counts(&title),
                content_words: word_counts(&content),
            },
        );
        Ok(outcome)
    }

    async fn search(&self, query: &TextQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let rows = self.read()?;
        let mut hits: Vec<SearchHit> = rows
            .values()
            .filter_map(|r| r.rank(query).map(|rank| r.to_hit(rank)))
            .collect();
        hits.sort_by(|a, b| {
            b.rank
                .partial_cmp(&a.rank)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| newest_first(a, b))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SearchHit>> {
        let rows = self.read()?;
        let mut hits: Vec<SearchHit> = rows.values().map(|r| r.to_hit(0.0)).collect();
        hits.sort_by(newest_first);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>> {
        let rows = self.read()?;
        Ok(rows.get(url).map(|r| r.article.clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryPlan;
    use chrono::DateTime;

    fn upsert(url: &str, title: &str, content: &str, published: &str) -> ArticleUpsert {
        ArticleUpsert {
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            published_at: DateTime::parse_from_rfc3339(published).unwrap(),
        }
    }

    fn query(raw: &str) -> TextQuery {
        match TextQuery::parse(raw) {
            QueryPlan::Match(q) => q,
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upsert_outcomes() {
        let store = InMemoryStore::new();
        let a = upsert("https://b/a", "A", "alpha", "2024-01-01T00:00:00Z");
        assert_eq!(store.upsert_article(&a).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert_article(&a).await.unwrap(), UpsertOutcome::Unchanged);

        let id_before = store.get_article("https://b/a").await.unwrap().unwrap().id;
        let a2 = upsert("https://b/a", "A", "alpha beta", "2024-01-02T00:00:00Z");
        assert_eq!(store.upsert_article(&a2).await.unwrap(), UpsertOutcome::Updated);
        let after = store.get_article("https://b/a").await.unwrap().unwrap();
        assert_eq!(after.id, id_before);
        assert_eq!(after.content, "alpha beta");
    }

    #[tokio::test]
    async fn test_search_vector_follows_content() {
        let store = InMemoryStore::new();
        store
            .upsert_article(&upsert("https://b/a", "A", "alpha", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .upsert_article(&upsert("https://b/a", "A", "gamma", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();
        assert!(store.search(&query("alpha"), 10).await.unwrap().is_empty());
        assert_eq!(store.search(&query("gamma"), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_title_higher() {
        let store = InMemoryStore::new();
        store
            .upsert_article(&upsert("https://b/body", "Other", "rust", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();
        store
            .upsert_article(&upsert("https://b/title", "Rust", "text", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        let hits = store.search(&query("rust"), 10).await.unwrap();
        assert_eq!(hits[0].url, "https://b/title");
        assert_eq!(hits[1].url, "https://b/body");
    }

    #[tokio::test]
    async fn test_delete_and_recent() {
        let store = InMemoryStore::new();
        for (i, day) in ["01", "03", "02"].iter().enumerate() {
            store
                .upsert_article(&upsert(
                    &format!("https://b/{}", i),
                    "t",
                    "c",
                    &format!("2024-01-{}T00:00:00Z", day),
                ))
                .await
                .unwrap();
        }
        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent[0].url, "https://b/1");
        assert_eq!(recent[1].url, "https://b/2");

        let removed = store
            .delete_by_urls(&["https://b/1".to_string(), "https://b/missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
