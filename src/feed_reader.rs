//! Paginated feed reader.
//!
//! Walks the remote listing with `start-index`/`max-results` until a page
//! comes back with no entries and returns the complete snapshot. Any page
//! failure aborts the whole read: a partial snapshot is never returned,
//! because the sync driver would mistake the missing tail for deletions.
//!
//! # Retry Strategy
//!
//! Each page request is retried with exponential backoff:
//! - Network errors → retry
//! - HTTP 429 (rate limited) and 5xx → retry
//! - Other 4xx → fail immediately
//!
//! The delay starts at `feed.retry_backoff_ms` and doubles per attempt.

use async_trait::async_trait;
use std::time::Duration;

use feed_mirror_core::error::FeedError;
use feed_mirror_core::feed::{parse_feed_page, FeedPage};
use feed_mirror_core::models::FeedItem;

use crate::config::FeedConfig;

/// A source of feed pages.
///
/// `offset` is the 1-based entry index the page starts at.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<FeedPage, FeedError>;
}

/// Fetches feed pages over HTTP.
pub struct HttpFeedSource {
    client: reqwest::Client,
    base_url: String,
    alt: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpFeedSource {
    pub fn new(config: &FeedConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            alt: config.alt.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff * (1u32 << (attempt - 1).min(5))
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<FeedPage, FeedError> {
        let params = [
            ("alt", self.alt.clone()),
            ("start-index", offset.to_string()),
            ("max-results", limit.to_string()),
        ];

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                tracing::debug!(offset, attempt, ?delay, "retrying feed page");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .get(&self.base_url)
                .query(&params)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response.text().await.map_err(|e| {
                            FeedError::unavailable(format!(
                                "reading page at offset {}: {}",
                                offset, e
                            ))
                        })?;
                        return parse_feed_page(&body);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(FeedError::unavailable(format!(
                            "HTTP {} for page at offset {}",
                            status, offset
                        )));
                        continue;
                    }

                    return Err(FeedError::unavailable(format!(
                        "HTTP {} for page at offset {}",
                        status, offset
                    )));
                }
                Err(e) => {
                    last_err = Some(FeedError::unavailable(format!(
                        "request for page at offset {} failed: {}",
                        offset, e
                    )));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| FeedError::unavailable("feed page failed after retries")))
    }
}

/// Read every feed item, in feed order.
///
/// The cursor advances by the number of raw entries on each page, so
/// entries dropped during parsing never shift later pages. The walk stops
/// at the first empty page; exceeding `max_pages` is treated as a failure.
pub async fn read_all_items(
    source: &dyn FeedSource,
    config: &FeedConfig,
) -> Result<Vec<FeedItem>, FeedError> {
    let mut items = Vec::new();
    let mut offset = config.initial_offset;
    let mut dropped = 0usize;

    for page_no in 0..config.max_pages {
        if page_no > 0 && !config.page_delay().is_zero() {
            tokio::time::sleep(config.page_delay()).await;
        }

        let page = source.fetch_page(offset, config.page_size).await?;
        if page.is_terminal() {
            tracing::info!(
                items = items.len(),
                pages = page_no,
                dropped,
                "feed read complete"
            );
            return Ok(items);
        }

        if page.dropped > 0 {
            tracing::warn!(
                offset,
                dropped = page.dropped,
                "feed entries without a usable link or timestamp were skipped"
            );
        }
        tracing::debug!(offset, entries = page.raw_entries, "feed page read");

        dropped += page.dropped;
        offset += page.raw_entries;
        items.extend(page.items);
    }

    Err(FeedError::unavailable(format!(
        "feed did not end within {} pages",
        config.max_pages
    )))
}
