//! Feed page parsing.
//!
//! The remote listing endpoint serves GData-style JSON (the format used by
//! Blogger feeds), either bare or wrapped in a JSONP callback:
//!
//! ```json
//! {"feed": {"entry": [
//!   {"title": {"$t": "Hello"},
//!    "published": {"$t": "2024-03-01T10:00:00.000+07:00"},
//!    "link": [{"rel": "alternate", "href": "https://blog.example/hello.html"}]}
//! ]}}
//! ```
//!
//! A page without entries is the end of the feed. Entries that lack a
//! resolvable canonical link or a timestamp are dropped and counted, not
//! treated as errors.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use url::Url;

use crate::error::FeedError;
use crate::models::FeedItem;

/// One parsed page of the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    /// Valid entries in feed order.
    pub items: Vec<FeedItem>,
    /// Number of entries present on the page, including dropped ones.
    pub raw_entries: usize,
    /// Entries dropped for lacking a link or timestamp.
    pub dropped: usize,
}

impl FeedPage {
    /// True if this page terminates pagination.
    pub fn is_terminal(&self) -> bool {
        self.raw_entries == 0
    }
}

/// Parse one page body into a [`FeedPage`].
///
/// # Errors
///
/// Returns [`FeedError::Parse`] if the body is not JSON (after removing a
/// JSONP wrapper) or has no top-level `feed` object.
pub fn parse_feed_page(body: &str) -> Result<FeedPage, FeedError> {
    let json_text = unwrap_jsonp(body);
    let doc: Value = serde_json::from_str(json_text)
        .map_err(|e| FeedError::parse(format!("invalid JSON: {}", e)))?;

    let feed = doc
        .get("feed")
        .filter(|f| f.is_object())
        .ok_or_else(|| FeedError::parse("missing top-level 'feed' object"))?;

    let entries = match feed.get("entry") {
        None | Some(Value::Null) => return Ok(FeedPage::default()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(FeedError::parse("'feed.entry' is not an array")),
    };

    let mut page = FeedPage {
        items: Vec::with_capacity(entries.len()),
        raw_entries: entries.len(),
        dropped: 0,
    };

    for entry in entries {
        match parse_entry(entry) {
            Some(item) => page.items.push(item),
            None => page.dropped += 1,
        }
    }

    Ok(page)
}

fn parse_entry(entry: &Value) -> Option<FeedItem> {
    let url = canonical_link(entry)?;
    let published_at = text_field(entry, "published")
        .and_then(parse_timestamp)
        .or_else(|| text_field(entry, "updated").and_then(parse_timestamp))?;
    let title = text_field(entry, "title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    Some(FeedItem {
        url,
        title,
        published_at,
    })
}

/// The first `rel="alternate"` link with an absolute http(s) URL.
fn canonical_link(entry: &Value) -> Option<String> {
    entry
        .get("link")?
        .as_array()?
        .iter()
        .filter(|l| l.get("rel").and_then(Value::as_str) == Some("alternate"))
        .filter_map(|l| l.get("href").and_then(Value::as_str))
        .find_map(|href| {
            let parsed = Url::parse(href.trim()).ok()?;
            match parsed.scheme() {
                "http" | "https" => Some(parsed.to_string()),
                _ => None,
            }
        })
}

/// GData wraps text values as `{"$t": "..."}`; plain strings are accepted too.
fn text_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    match entry.get(key)? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("$t").and_then(Value::as_str),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

/// Strip a JSONP wrapper such as `// API callback\ncb({...});`.
fn unwrap_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => trimmed[open + 1..close].trim(),
        _ => trimmed,
    }
}
