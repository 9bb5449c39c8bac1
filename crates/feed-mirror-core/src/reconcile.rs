//! Reconciliation planning.
//!
//! Diffs a complete feed snapshot against a complete store snapshot and
//! decides, per URL, whether to delete, insert, update, or leave it alone.
//! Planning is pure; the application's sync driver executes the plan.
//!
//! # Rules
//!
//! 1. Deletions are `keys(store) − keys(feed)`.
//! 2. A feed URL missing from the store is an insert.
//! 3. A feed URL in the store is an update only when the feed timestamp is
//!    strictly newer (or unconditionally in [`SyncMode::Force`]).
//! 4. Everything else is unchanged.
//! 5. Repeated feed URLs collapse to their last occurrence.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::models::{ArticleStamp, FeedItem};

/// How feed items are gated against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Only rewrite articles whose feed timestamp is strictly newer.
    #[default]
    Incremental,
    /// Rewrite every feed item regardless of timestamps.
    Force,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub kind: ChangeKind,
    pub item: FeedItem,
}

/// Everything a sync run intends to do.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Orphaned URLs, sorted for deterministic batching.
    pub deletions: Vec<String>,
    /// Inserts and updates in feed order.
    pub changes: Vec<PlannedChange>,
    /// Feed URLs already up to date.
    pub unchanged: usize,
    /// Feed entries that repeated an earlier URL.
    pub duplicates: usize,
}

impl SyncPlan {
    pub fn inserts(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Insert)
            .count()
    }

    pub fn updates(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Update)
            .count()
    }
}

/// Compute the plan for one run from complete snapshots of both sides.
pub fn plan_sync(feed: &[FeedItem], stored: &[ArticleStamp], mode: SyncMode) -> SyncPlan {
    let stored_map: HashMap<&str, DateTime<FixedOffset>> = stored
        .iter()
        .map(|s| (s.url.as_str(), s.published_at))
        .collect();

    // Last occurrence wins; remember where it sits in the feed.
    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(feed.len());
    for (i, item) in feed.iter().enumerate() {
        last_index.insert(item.url.as_str(), i);
    }
    let duplicates = feed.len() - last_index.len();

    let mut plan = SyncPlan {
        duplicates,
        ..SyncPlan::default()
    };

    for (i, item) in feed.iter().enumerate() {
        if last_index.get(item.url.as_str()) != Some(&i) {
            continue;
        }
        let kind = match stored_map.get(item.url.as_str()) {
            None => Some(ChangeKind::Insert),
            Some(_) if mode == SyncMode::Force => Some(ChangeKind::Update),
            Some(stored_at) if item.published_at > *stored_at => Some(ChangeKind::Update),
            Some(_) => None,
        };
        match kind {
            Some(kind) => plan.changes.push(PlannedChange {
                kind,
                item: item.clone(),
            }),
            None => plan.unchanged += 1,
        }
    }

    let feed_urls: HashSet<&str> = last_index.keys().copied().collect();
    let mut deletions: Vec<String> = stored
        .iter()
        .filter(|s| !feed_urls.contains(s.url.as_str()))
        .map(|s| s.url.clone())
        .collect();
    deletions.sort();
    deletions.dedup();
    plan.deletions = deletions;

    plan
}

/// A delete batch the store rejected.
#[derive(Debug, Clone, Serialize)]
pub struct FailedBatch {
    /// 1-based batch number within the run.
    pub batch: usize,
    pub size: usize,
    pub error: String,
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Feed entries read, including duplicates.
    pub feed_items: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Items left alone: staleness-gated or byte-identical.
    pub unchanged: usize,
    /// Items not written this run: empty content, fetch or upsert failure.
    pub skipped: usize,
    /// Rows the store reported removed. URLs already gone are not counted.
    pub deleted: usize,
    pub delete_attempted: usize,
    pub failed_delete_batches: Vec<FailedBatch>,
    pub duplicates: usize,
}

impl SyncReport {
    /// True if every attempted write succeeded.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.failed_delete_batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn item(url: &str, title: &str, published: &str) -> FeedItem {
        FeedItem {
            url: url.to_string(),
            title: title.to_string(),
            published_at: ts(published),
        }
    }

    fn stamp(url: &str, published: &str) -> ArticleStamp {
        ArticleStamp {
            url: url.to_string(),
            published_at: ts(published),
        }
    }

    #[test]
    fn test_classifies_insert_update_unchanged_delete() {
        let feed = vec![
            item("https://b/new", "New", "2024-01-05T00:00:00Z"),
            item("https://b/newer", "Newer", "2024-01-04T00:00:00Z"),
            item("https://b/same", "Same", "2024-01-03T00:00:00Z"),
            item("https://b/older", "Older", "2024-01-01T00:00:00Z"),
        ];
        let stored = vec![
            stamp("https://b/newer", "2024-01-02T00:00:00Z"),
            stamp("https://b/same", "2024-01-03T00:00:00Z"),
            stamp("https://b/older", "2024-01-02T00:00:00Z"),
            stamp("https://b/gone", "2023-12-31T00:00:00Z"),
        ];

        let plan = plan_sync(&feed, &stored, SyncMode::Incremental);
        assert_eq!(plan.deletions, vec!["https://b/gone".to_string()]);
        assert_eq!(plan.inserts(), 1);
        assert_eq!(plan.updates(), 1);
        assert_eq!(plan.unchanged, 2);
        assert_eq!(plan.changes[0].item.url, "https://b/new");
        assert_eq!(plan.changes[1].item.url, "https://b/newer");
    }

    #[test]
    fn test_equal_instant_in_other_offset_is_unchanged() {
        let feed = vec![item("https://b/a", "A", "2024-01-01T07:00:00+07:00")];
        let stored = vec![stamp("https://b/a", "2024-01-01T00:00:00Z")];
        let plan = plan_sync(&feed, &stored, SyncMode::Incremental);
        assert!(plan.changes.is_empty());
        assert_eq!(plan.unchanged, 1);
    }

    #[test]
    fn test_force_mode_updates_everything_present() {
        let feed = vec![
            item("https://b/a", "A", "2024-01-01T00:00:00Z"),
            item("https://b/b", "B", "2024-01-01T00:00:00Z"),
        ];
        let stored = vec![stamp("https://b/a", "2024-06-01T00:00:00Z")];
        let plan = plan_sync(&feed, &stored, SyncMode::Force);
        assert_eq!(plan.updates(), 1);
        assert_eq!(plan.inserts(), 1);
        assert_eq!(plan.unchanged, 0);
    }

    #[test]
    fn test_duplicate_urls_last_occurrence_wins() {
        let feed = vec![
            item("https://b/a", "First", "2024-01-09T00:00:00Z"),
            item("https://b/x", "X", "2024-01-01T00:00:00Z"),
            item("https://b/a", "Second", "2024-01-02T00:00:00Z"),
        ];
        let stored = vec![stamp("https://b/a", "2024-01-05T00:00:00Z")];
        let plan = plan_sync(&feed, &stored, SyncMode::Incremental);
        assert_eq!(plan.duplicates, 1);
        // The later entry is older than the store, so /a is unchanged.
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].item.url, "https://b/x");
    }

    #[test]
    fn test_empty_feed_orphans_everything() {
        let stored = vec![
            stamp("https://b/2", "2024-01-01T00:00:00Z"),
            stamp("https://b/1", "2024-01-01T00:00:00Z"),
        ];
        let plan = plan_sync(&[], &stored, SyncMode::Incremental);
        assert_eq!(plan.deletions, vec!["https://b/1", "https://b/2"]);
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn test_report_is_clean() {
        let mut report = SyncReport::default();
        assert!(report.is_clean());
        report.failed_delete_batches.push(FailedBatch {
            batch: 1,
            size: 100,
            error: "boom".into(),
        });
        assert!(!report.is_clean());
    }
}
