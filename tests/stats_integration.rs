//! `fmirror stats` summary against a real SQLite database.

use chrono::DateTime;
use tempfile::TempDir;

use feed_mirror::config::Config;
use feed_mirror::db;
use feed_mirror::migrate;
use feed_mirror::sqlite_store::SqliteStore;
use feed_mirror::stats::database_stats;
use feed_mirror_core::models::ArticleUpsert;
use feed_mirror_core::store::ArticleStore;

fn test_config(tmp: &TempDir) -> Config {
    let text = format!(
        r#"
[db]
path = "{}"

[feed]
base_url = "https://blog.example/feeds/posts/default"

[server]
bind = "127.0.0.1:0"
"#,
        tmp.path().join("mirror.sqlite").display()
    );
    toml::from_str(&text).unwrap()
}

#[tokio::test]
async fn test_stats_on_missing_schema_errors_then_recovers() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);

    assert!(database_stats(&cfg).await.is_err());

    migrate::run_migrations(&cfg).await.unwrap();
    let stats = database_stats(&cfg).await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.newest, None);
    assert_eq!(stats.oldest, None);
    assert_eq!(stats.last_sync, None);
}

#[tokio::test]
async fn test_stats_report_publication_range() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = db::connect(&cfg).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    let store = SqliteStore::new(pool.clone());

    for (path, published) in [
        ("b", "2024-02-01T08:00:00+07:00"),
        ("a", "2023-12-31T23:00:00Z"),
        ("c", "2024-03-05T10:30:00+07:00"),
    ] {
        store
            .upsert_article(&ArticleUpsert {
                url: format!("https://blog.example/{}", path),
                title: path.to_string(),
                content: "body".to_string(),
                published_at: DateTime::parse_from_rfc3339(published).unwrap(),
            })
            .await
            .unwrap();
    }
    pool.close().await;

    let stats = database_stats(&cfg).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.newest.as_deref(), Some("2024-03-05T10:30:00+07:00"));
    assert_eq!(stats.oldest.as_deref(), Some("2023-12-31T23:00:00Z"));
    assert!(stats.last_sync.is_some());
}
