//! Synchronization driver.
//!
//! Executes one reconcile run: read the complete feed, read the complete
//! store snapshot, plan, delete orphans in batches, then fetch and upsert
//! every planned change.
//!
//! Only the two snapshot reads can abort a run ([`SyncError`]). Delete
//! batch failures and per-item fetch/upsert failures are logged, counted
//! in the [`SyncReport`], and retried naturally by the next run.

use anyhow::Result;

use feed_mirror_core::error::SyncError;
use feed_mirror_core::models::{ArticleUpsert, UpsertOutcome};
use feed_mirror_core::reconcile::{
    plan_sync, FailedBatch, PlannedChange, SyncMode, SyncPlan, SyncReport,
};
use feed_mirror_core::store::ArticleStore;

use crate::config::{Config, FeedConfig, SyncConfig};
use crate::content::{ContentFetcher, HttpContentFetcher};
use crate::db;
use crate::feed_reader::{read_all_items, FeedSource, HttpFeedSource};
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// A planned run, before anything is written.
#[derive(Debug, Clone)]
pub struct PreparedSync {
    /// Feed entries read, including duplicates.
    pub feed_items: usize,
    pub plan: SyncPlan,
}

/// Drives one synchronization against its collaborators.
pub struct Reconciler<'a> {
    feed: &'a dyn FeedSource,
    content: &'a dyn ContentFetcher,
    store: &'a dyn ArticleStore,
    feed_config: &'a FeedConfig,
    sync_config: &'a SyncConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        config: &'a Config,
        feed: &'a dyn FeedSource,
        content: &'a dyn ContentFetcher,
        store: &'a dyn ArticleStore,
    ) -> Self {
        Self {
            feed,
            content,
            store,
            feed_config: &config.feed,
            sync_config: &config.sync,
        }
    }

    /// Read both snapshots and compute the plan. Writes nothing.
    pub async fn prepare(&self, mode: SyncMode) -> Result<PreparedSync, SyncError> {
        let feed = read_all_items(self.feed, self.feed_config).await?;

        let stored = self
            .store
            .list_stamps()
            .await
            .map_err(|e| SyncError::StoreRead(format!("{:#}", e)))?;

        if feed.is_empty() && !stored.is_empty() && !self.sync_config.allow_empty_feed {
            tracing::warn!(
                stored = stored.len(),
                "feed returned no items; leaving the store untouched (set sync.allow_empty_feed to converge)"
            );
            return Ok(PreparedSync {
                feed_items: 0,
                plan: SyncPlan::default(),
            });
        }

        let plan = plan_sync(&feed, &stored, mode);
        tracing::info!(
            feed_items = feed.len(),
            stored = stored.len(),
            inserts = plan.inserts(),
            updates = plan.updates(),
            deletions = plan.deletions.len(),
            unchanged = plan.unchanged,
            ?mode,
            "sync planned"
        );

        Ok(PreparedSync {
            feed_items: feed.len(),
            plan,
        })
    }

    /// Run a full synchronization.
    ///
    /// # Errors
    ///
    /// [`SyncError`] if either snapshot could not be read. In that case no
    /// write has been issued.
    pub async fn synchronize(&self, mode: SyncMode) -> Result<SyncReport, SyncError> {
        let prepared = self.prepare(mode).await?;

        let mut report = SyncReport {
            feed_items: prepared.feed_items,
            unchanged: prepared.plan.unchanged,
            duplicates: prepared.plan.duplicates,
            ..SyncReport::default()
        };

        self.delete_orphans(&prepared.plan.deletions, &mut report)
            .await;
        self.apply_changes(&prepared.plan.changes, &mut report)
            .await;

        tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            deleted = report.deleted,
            delete_attempted = report.delete_attempted,
            "sync finished"
        );

        Ok(report)
    }

    async fn delete_orphans(&self, urls: &[String], report: &mut SyncReport) {
        for (idx, batch) in urls.chunks(self.sync_config.delete_batch_size).enumerate() {
            let batch_no = idx + 1;
            report.delete_attempted += batch.len();

            match self.store.delete_by_urls(batch).await {
                Ok(removed) => {
                    tracing::debug!(batch = batch_no, size = batch.len(), removed, "delete batch committed");
                    report.deleted += removed as usize;
                }
                Err(e) => {
                    tracing::warn!(batch = batch_no, size = batch.len(), error = %format!("{:#}", e), "delete batch failed");
                    report.failed_delete_batches.push(FailedBatch {
                        batch: batch_no,
                        size: batch.len(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }
    }

    async fn apply_changes(&self, changes: &[PlannedChange], report: &mut SyncReport) {
        let delay = self.sync_config.item_delay();

        for (idx, change) in changes.iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let url = &change.item.url;
            let content = match self.content.fetch(url).await {
                Ok(Some(text)) if !text.trim().is_empty() => text,
                Ok(_) => {
                    tracing::info!(url = %url, "no content extracted; skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "content fetch failed; skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            let article = ArticleUpsert::from_feed_item(&change.item, content);
            match self.store.upsert_article(&article).await {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Ok(UpsertOutcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    tracing::warn!(url = %url, error = %format!("{:#}", e), "upsert failed; skipping");
                    report.skipped += 1;
                }
            }
        }
    }
}

/// Run one synchronization from the CLI and print the report.
pub async fn run_sync(config: &Config, mode: SyncMode, dry_run: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = sync_with_pool(config, &pool, mode, dry_run).await;
    pool.close().await;
    result
}

async fn sync_with_pool(
    config: &Config,
    pool: &sqlx::SqlitePool,
    mode: SyncMode,
    dry_run: bool,
) -> Result<()> {
    migrate::migrate_pool(pool).await?;

    let feed = HttpFeedSource::new(&config.feed)?;
    let content = HttpContentFetcher::new(&config.content)?;
    let store = SqliteStore::new(pool.clone());
    let reconciler = Reconciler::new(config, &feed, &content, &store);

    if dry_run {
        let prepared = reconciler.prepare(mode).await?;
        print_plan(&prepared, mode);
        return Ok(());
    }

    let report = reconciler.synchronize(mode).await?;
    print_report(&report, mode);
    Ok(())
}

fn mode_label(mode: SyncMode) -> &'static str {
    match mode {
        SyncMode::Incremental => "incremental",
        SyncMode::Force => "force",
    }
}

fn print_plan(prepared: &PreparedSync, mode: SyncMode) {
    let plan = &prepared.plan;
    println!("sync {} (dry-run)", mode_label(mode));
    println!("  feed items: {}", prepared.feed_items);
    println!("  to insert: {}", plan.inserts());
    println!("  to update: {}", plan.updates());
    println!("  unchanged: {}", plan.unchanged);
    println!("  to delete: {}", plan.deletions.len());
    if plan.duplicates > 0 {
        println!("  duplicate feed entries: {}", plan.duplicates);
    }
}

fn print_report(report: &SyncReport, mode: SyncMode) {
    println!("sync {}", mode_label(mode));
    println!("  feed items: {}", report.feed_items);
    println!("  inserted: {}", report.inserted);
    println!("  updated: {}", report.updated);
    println!("  unchanged: {}", report.unchanged);
    println!("  skipped: {}", report.skipped);
    println!(
        "  deleted: {} of {} attempted",
        report.deleted, report.delete_attempted
    );
    for failed in &report.failed_delete_batches {
        println!(
            "  delete batch {} ({} urls) failed: {}",
            failed.batch, failed.size, failed.error
        );
    }
    if report.duplicates > 0 {
        println!("  duplicate feed entries: {}", report.duplicates);
    }
    if report.is_clean() {
        println!("ok");
    } else {
        println!("completed with errors");
    }
}
