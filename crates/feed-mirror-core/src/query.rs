//! Structured text queries.
//!
//! User input never reaches a backend as raw syntax. [`TextQuery::parse`]
//! folds and tokenizes the input into a list of required terms plus a
//! declared [`TermJoin`]; each store renders that into its own query
//! language at the adapter boundary.
//!
//! | Input | Plan |
//! |-------|------|
//! | `""`, `"   "` | [`QueryPlan::Recent`] |
//! | `"Rust  async"` | `Match(["rust", "async"], And)` |
//! | `"Việt"` | `Match(["viet"], And)` |
//! | `"c++ rust"` | `Match(["c", "rust"], And)` |
//! | `"rust ???"` | [`QueryPlan::NoMatch`] (a required token can never match) |

use crate::fold::{fold_text, words};

/// How the root terms of a query combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermJoin {
    /// Every term is required.
    And,
}

/// A normalized, backend-neutral text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    terms: Vec<String>,
    join: TermJoin,
}

/// What the search pipeline should do with a raw query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// No input: list the most recent articles.
    Recent,
    /// Input that cannot match any document.
    NoMatch,
    Match(TextQuery),
}

impl TextQuery {
    /// Build a query from already-folded terms.
    ///
    /// Returns `None` if `terms` is empty or any term is not a single word.
    pub fn new(terms: Vec<String>, join: TermJoin) -> Option<Self> {
        if terms.is_empty() {
            return None;
        }
        let single_words = terms
            .iter()
            .all(|t| words(t).count() == 1 && words(t).next() == Some(t.as_str()));
        if !single_words {
            return None;
        }
        Some(Self { terms, join })
    }

    /// Turn raw user input into a [`QueryPlan`].
    ///
    /// Whitespace separates tokens; every token is required. A token is
    /// folded and split into word runs, each of which becomes a term. A
    /// token with no word characters at all makes the query unmatchable.
    pub fn parse(raw: &str) -> QueryPlan {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            return QueryPlan::Recent;
        }

        let mut terms: Vec<String> = Vec::new();
        for token in tokens {
            let folded = fold_text(token);
            let mut any = false;
            for word in words(&folded) {
                any = true;
                if !terms.iter().any(|t| t == word) {
                    terms.push(word.to_string());
                }
            }
            if !any {
                return QueryPlan::NoMatch;
            }
        }

        match Self::new(terms, TermJoin::And) {
            Some(q) => QueryPlan::Match(q),
            None => QueryPlan::NoMatch,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn join(&self) -> TermJoin {
        self.join
    }

    /// True if a document with these folded words satisfies the query.
    pub fn matches(&self, mut has_word: impl FnMut(&str) -> bool) -> bool {
        match self.join {
            TermJoin::And => self.terms.iter().all(|t| has_word(t)),
        }
    }
}
