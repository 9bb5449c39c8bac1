//! TOML configuration parsing and validation.
//!
//! Every tunable the sync and search pipelines use lives here and is
//! passed down explicitly; nothing reads process-wide state.
//!
//! ```toml
//! [db]
//! path = "./data/mirror.sqlite"
//!
//! [feed]
//! base_url = "https://example.blogspot.com/feeds/posts/default"
//! page_size = 50
//!
//! [content]
//! selector = "div.post-body"
//!
//! [sync]
//! delete_batch_size = 100
//! item_delay_ms = 1000
//!
//! [search]
//! page_size = 20
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use feed_mirror_core::search::SearchParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_busy_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Listing endpoint, e.g. `https://<blog>/feeds/posts/default`.
    pub base_url: String,
    /// `json` or `json-in-script`.
    #[serde(default = "default_alt")]
    pub alt: String,
    #[serde(default = "default_initial_offset")]
    pub initial_offset: usize,
    #[serde(default = "default_feed_page_size")]
    pub page_size: usize,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_alt() -> String {
    "json".to_string()
}
fn default_initial_offset() -> usize {
    1
}
fn default_feed_page_size() -> usize {
    50
}
fn default_page_delay_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    1000
}
fn default_max_pages() -> usize {
    1000
}
fn default_user_agent() -> String {
    format!("feed-mirror/{}", env!("CARGO_PKG_VERSION"))
}

impl FeedConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// CSS selector list; the first matching element is the article body.
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extracted text shorter than this (non-whitespace chars) counts as empty.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            timeout_secs: default_timeout_secs(),
            min_chars: default_min_chars(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_selector() -> String {
    "div.post-body, article, main, body".to_string()
}
fn default_min_chars() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,
    /// Converge to an empty store when the feed is empty.
    #[serde(default)]
    pub allow_empty_feed: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delete_batch_size: default_delete_batch_size(),
            item_delay_ms: default_item_delay_ms(),
            allow_empty_feed: false,
        }
    }
}

fn default_delete_batch_size() -> usize {
    100
}
fn default_item_delay_ms() -> u64 {
    1000
}

impl SyncConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_result_page_size")]
    pub page_size: usize,
    #[serde(default = "default_result_page_size")]
    pub recent_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_result_page_size(),
            recent_limit: default_result_page_size(),
        }
    }
}

fn default_result_page_size() -> usize {
    20
}

impl SearchConfig {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            page_size: self.page_size,
            recent_limit: self.recent_limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check invariants that serde defaults cannot express.
pub fn validate(config: &Config) -> Result<()> {
    let feed_url = url::Url::parse(&config.feed.base_url)
        .with_context(|| format!("feed.base_url is not a valid URL: {}", config.feed.base_url))?;
    if !matches!(feed_url.scheme(), "http" | "https") {
        anyhow::bail!("feed.base_url must be http or https");
    }

    match config.feed.alt.as_str() {
        "json" | "json-in-script" => {}
        other => anyhow::bail!(
            "Unknown feed.alt: '{}'. Must be json or json-in-script.",
            other
        ),
    }

    if config.feed.page_size == 0 {
        anyhow::bail!("feed.page_size must be > 0");
    }
    if config.feed.max_pages == 0 {
        anyhow::bail!("feed.max_pages must be > 0");
    }
    if config.sync.delete_batch_size == 0 {
        anyhow::bail!("sync.delete_batch_size must be > 0");
    }
    if config.search.page_size == 0 || config.search.recent_limit == 0 {
        anyhow::bail!("search.page_size and search.recent_limit must be > 0");
    }

    crate::content::parse_selectors(&config.content.selector)
        .context("content.selector is not a valid CSS selector list")?;

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}
