//! Article body retrieval.
//!
//! [`HttpContentFetcher`] downloads an article page and extracts readable
//! text from the content root. The configured selector is a comma-separated
//! list of alternatives tried left to right; the first alternative that
//! matches anything picks the root, so `div.post-body, body` prefers the
//! post body even though `body` comes first in the document.
//!
//! Extraction is a pure function ([`extract_text`]) so it can be tested
//! without a network.
//!
//! `Ok(None)` means the page had no usable text. The sync driver treats it
//! like a fetch error: the item is skipped and retried on the next run.

use async_trait::async_trait;
use scraper::{Html, Selector};

use feed_mirror_core::error::ContentFetchError;

use crate::config::ContentConfig;

/// Elements whose text is never part of an article body.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line in the extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "tr", "table", "section", "article", "header", "footer", "figure", "figcaption",
];

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<String>, ContentFetchError>;
}

pub struct HttpContentFetcher {
    client: reqwest::Client,
    selectors: Vec<Selector>,
    min_chars: usize,
}

impl HttpContentFetcher {
    pub fn new(config: &ContentConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            selectors: parse_selectors(&config.selector)?,
            min_chars: config.min_chars,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>, ContentFetchError> {
        let transport = |e: reqwest::Error| ContentFetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(transport)?;
        let text = extract_text(&html, &self.selectors);

        if has_min_chars(&text, self.min_chars) {
            Ok(Some(text))
        } else {
            Ok(None)
        }
    }
}

/// Parse a comma-separated selector list into ordered alternatives.
pub fn parse_selectors(list: &str) -> anyhow::Result<Vec<Selector>> {
    let selectors = list
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Selector::parse(part)
                .map_err(|e| anyhow::anyhow!("invalid content selector '{}': {:?}", part, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if selectors.is_empty() {
        anyhow::bail!("content selector list is empty");
    }
    Ok(selectors)
}

/// Extract readable text from the content root.
///
/// Lines are trimmed and blank lines dropped. Returns an empty string when
/// no alternative matches.
pub fn extract_text(html: &str, selectors: &[Selector]) -> String {
    let document = Html::parse_document(html);
    let Some(root) = selectors
        .iter()
        .find_map(|selector| document.select(selector).next())
    else {
        return String::new();
    };

    let mut buf = String::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
            });
            if !hidden {
                buf.push_str(text);
            }
        } else if let Some(el) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&el.name()) {
                buf.push('\n');
            }
        }
    }

    buf.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_min_chars(text: &str, min_chars: usize) -> bool {
    text.chars().filter(|c| !c.is_whitespace()).take(min_chars).count() >= min_chars.max(1)
}
