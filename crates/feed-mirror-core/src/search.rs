//! Search pipeline.
//!
//! Turns free-text user input into an ordered, highlighted result page.
//! The pipeline operates entirely through the [`ArticleStore`] trait; the
//! calling application supplies the store and [`SearchParams`].
//!
//! # Pipeline
//!
//! 1. Parse the raw input into a [`QueryPlan`].
//! 2. `Recent` → the newest `recent_limit` articles, no ranking.
//! 3. `NoMatch` → empty result, the store is not consulted.
//! 4. `Match` → ranked store query for `page_size` rows.
//! 5. Sort by relevance (desc), then `published_at` (desc), then URL.
//! 6. Build snippets from the raw content and map to [`SearchResult`].

use crate::error::SearchError;
use crate::models::{format_timestamp, SearchHit, SearchResult};
use crate::query::{QueryPlan, TextQuery};
use crate::snippet;
use crate::store::ArticleStore;

/// Result size limits, decoupled from application config.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Maximum results for a text query.
    pub page_size: usize,
    /// Number of articles returned for an empty query.
    pub recent_limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            page_size: 20,
            recent_limit: 20,
        }
    }
}

/// Run one search against `store`.
///
/// # Errors
///
/// Only store failures surface, as [`SearchError`]. Queries that cannot
/// match anything return an empty list.
pub async fn search<S: ArticleStore + ?Sized>(
    store: &S,
    raw_query: &str,
    params: &SearchParams,
) -> Result<Vec<SearchResult>, SearchError> {
    match TextQuery::parse(raw_query) {
        QueryPlan::Recent => {
            let hits = store
                .recent(params.recent_limit)
                .await
                .map_err(|e| SearchError(format!("{:#}", e)))?;
            Ok(hits.into_iter().map(|h| to_result(h, &[])).collect())
        }
        QueryPlan::NoMatch => Ok(Vec::new()),
        QueryPlan::Match(query) => {
            let mut hits = store
                .search(&query, params.page_size)
                .await
                .map_err(|e| SearchError(format!("{:#}", e)))?;
            sort_hits(&mut hits);
            hits.truncate(params.page_size);
            Ok(hits
                .into_iter()
                .map(|h| to_result(h, query.terms()))
                .collect())
        }
    }
}

/// Relevance descending, then newest first, then URL for stability.
pub fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.rank
            .partial_cmp(&a.rank)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.published_at.cmp(&a.published_at))
            .then_with(|| a.url.cmp(&b.url))
    });
}

fn to_result(hit: SearchHit, terms: &[String]) -> SearchResult {
    let snippet = snippet::highlight(&hit.content, terms);
    SearchResult {
        id: hit.id,
        title: hit.title,
        url: hit.url,
        snippet,
        published_at: format_timestamp(&hit.published_at),
        relevance_rank: hit.rank,
        content: hit.content,
    }
}
