//! Highlighted excerpts for search results.
//!
//! Works on the raw article content so results read naturally, while
//! matching on folded words so highlights agree with the index.
//!
//! # Algorithm
//!
//! 1. Split content on whitespace into display words.
//! 2. A word matches if any of its folded word runs equals a query term.
//! 3. Start the window [`LEAD_WORDS`] words before the first match (or at
//!    the beginning if nothing matches) and take up to [`MAX_WORDS`] words.
//! 4. HTML-escape each word, wrap matches in `<strong>`/`</strong>`, and
//!    mark truncated ends with `…`.

use crate::fold::{fold_text, words};

/// Maximum number of words in a snippet.
pub const MAX_WORDS: usize = 40;

/// Words of context kept before the first match.
pub const LEAD_WORDS: usize = 6;

pub const START_SEL: &str = "<strong>";
pub const STOP_SEL: &str = "</strong>";
const ELLIPSIS: &str = "…";

/// Build a highlighted snippet of `content` for `terms` (already folded).
pub fn highlight(content: &str, terms: &[String]) -> String {
    let display: Vec<&str> = content.split_whitespace().collect();
    if display.is_empty() {
        return String::new();
    }

    let is_match = |word: &str| -> bool {
        let folded = fold_text(word);
        let hit = words(&folded).any(|w| terms.iter().any(|t| t == w));
        hit
    };

    let first_match = display.iter().position(|w| is_match(w));
    let start = first_match.map_or(0, |i| i.saturating_sub(LEAD_WORDS));
    let end = (start + MAX_WORDS).min(display.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str(ELLIPSIS);
        out.push(' ');
    }
    for (offset, word) in display[start..end].iter().enumerate() {
        if offset > 0 {
            out.push(' ');
        }
        let escaped = escape_html(word);
        if !terms.is_empty() && is_match(word) {
            out.push_str(START_SEL);
            out.push_str(&escaped);
            out.push_str(STOP_SEL);
        } else {
            out.push_str(&escaped);
        }
    }
    if end < display.len() {
        out.push(' ');
        out.push_str(ELLIPSIS);
    }
    out
}

/// The leading excerpt of `content`, without highlights.
pub fn excerpt(content: &str) -> String {
    highlight(content, &[])
}

fn escape_html(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_highlights_folded_matches() {
        let s = highlight("Học tiếng Việt mỗi ngày.", &terms(&["viet"]));
        assert_eq!(s, "Học tiếng <strong>Việt</strong> mỗi ngày.");
    }

    #[test]
    fn test_punctuation_attached_words_match() {
        let s = highlight("I like Rust, really.", &terms(&["rust"]));
        assert_eq!(s, "I like <strong>Rust,</strong> really.");
    }

    #[test]
    fn test_hyphenated_word_matches_any_part() {
        let s = highlight("Đọc thêm về rust-lang ở đây", &terms(&["lang"]));
        assert_eq!(s, "Đọc thêm về <strong>rust-lang</strong> ở đây");
    }

    #[test]
    fn test_window_starts_before_first_match() {
        let content: Vec<String> = (0..100).map(|i| format!("w{}", i)).collect();
        let mut content = content.join(" ");
        content.push_str(" needle tail");
        let s = highlight(&content, &terms(&["needle"]));
        assert!(s.starts_with("… w94 w95"));
        assert!(s.contains("<strong>needle</strong> tail"));
        assert!(!s.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_long_content_truncated() {
        let content: Vec<String> = (0..100).map(|i| format!("w{}", i)).collect();
        let s = excerpt(&content.join(" "));
        assert!(s.starts_with("w0 w1"));
        assert!(s.ends_with(" …"));
        assert_eq!(s.split_whitespace().count(), MAX_WORDS + 1);
    }

    #[test]
    fn test_escapes_html() {
        let s = highlight("<script> & rust", &terms(&["rust"]));
        assert_eq!(s, "&lt;script&gt; &amp; <strong>rust</strong>");
    }

    #[test]
    fn test_no_match_in_content_uses_leading_words() {
        let s = highlight("nothing here", &terms(&["title"]));
        assert_eq!(s, "nothing here");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(highlight("   ", &terms(&["x"])), "");
    }
}
