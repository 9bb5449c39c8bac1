//! Search pipeline over the SQLite store.

use chrono::{DateTime, Duration, FixedOffset};
use tempfile::TempDir;

use feed_mirror::config::Config;
use feed_mirror::db;
use feed_mirror::migrate;
use feed_mirror::sqlite_store::SqliteStore;
use feed_mirror_core::models::ArticleUpsert;
use feed_mirror_core::search::{search, SearchParams};
use feed_mirror_core::store::ArticleStore;

// ─── Helpers ────────────────────────────────────────────────────────

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

async fn open_store(tmp: &TempDir) -> SqliteStore {
    let cfg = test_config(tmp);
    let pool = db::connect(&cfg).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

async fn put(store: &SqliteStore, path: &str, title: &str, content: &str, published: &str) {
    store
        .upsert_article(&ArticleUpsert {
            url: format!("https://blog.example/{}", path),
            title: title.to_string(),
            content: content.to_string(),
            published_at: ts(published),
        })
        .await
        .unwrap();
}

async fn seed_vietnamese(store: &SqliteStore) {
    put(
        store,
        "ca-phe-sua-da",
        "Cà phê sữa đá",
        "Cách pha cà phê sữa đá đậm đà kiểu Sài Gòn.",
        "2024-01-01T08:00:00+07:00",
    )
    .await;
    put(
        store,
        "pho-bo",
        "Phở bò Hà Nội",
        "Nước dùng phở bò ninh xương trong nhiều giờ.",
        "2024-01-02T08:00:00+07:00",
    )
    .await;
    put(
        store,
        "ca-phe-trung",
        "Cà phê trứng",
        "Món cà phê trứng nổi tiếng của Hà Nội.",
        "2024-01-03T08:00:00+07:00",
    )
    .await;
}

fn urls(results: &[feed_mirror_core::models::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.url.as_str()).collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_every_term_is_required() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    let results = search(&store, "cà phê hà nội", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(urls(&results), vec!["https://blog.example/ca-phe-trung"]);

    let results = search(&store, "cà phê", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(!urls(&results).contains(&"https://blog.example/pho-bo"));
}

#[tokio::test]
async fn test_case_and_diacritic_insensitive() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    let plain = search(&store, "ca phe", &SearchParams::default())
        .await
        .unwrap();
    let accented = search(&store, "CÀ PHÊ", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(urls(&plain), urls(&accented));
    assert_eq!(plain.len(), 2);

    let results = search(&store, "PHO", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(urls(&results), vec!["https://blog.example/pho-bo"]);
}

#[tokio::test]
async fn test_results_carry_highlighted_snippet() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    let results = search(&store, "trứng", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.title, "Cà phê trứng");
    assert!(hit.snippet.contains("<strong>trứng</strong>"));
    assert!(hit.relevance_rank > 0.0);
    assert_eq!(hit.published_at, "2024-01-03T08:00:00+07:00");
}

#[tokio::test]
async fn test_title_matches_outrank_body_matches() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    put(
        &store,
        "body-only",
        "Ghi chép buổi sáng",
        "Hôm nay trời mưa. Tôi ngồi đọc sách rất lâu rồi mới đi uống trà.",
        "2024-02-02T00:00:00Z",
    )
    .await;
    put(
        &store,
        "title-and-body",
        "Trà sen Tây Hồ",
        "Trà ướp sen.",
        "2024-02-01T00:00:00Z",
    )
    .await;

    let results = search(&store, "tra", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(
        urls(&results),
        vec![
            "https://blog.example/title-and-body",
            "https://blog.example/body-only"
        ]
    );
}

#[tokio::test]
async fn test_empty_query_returns_newest() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let base = ts("2024-01-01T00:00:00Z");
    for i in 0..25 {
        let published = (base + Duration::days(i)).to_rfc3339();
        put(&store, &format!("post-{:02}", i), "Post", "body", &published).await;
    }

    let results = search(&store, "   ", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 20);
    assert_eq!(results[0].url, "https://blog.example/post-24");
    assert_eq!(results[19].url, "https://blog.example/post-05");
    assert!(results.iter().all(|r| r.relevance_rank == 0.0));
    assert!(results
        .windows(2)
        .all(|w| w[0].published_at >= w[1].published_at));
}

#[tokio::test]
async fn test_empty_query_on_small_store_returns_all() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    let results = search(&store, "", &SearchParams::default()).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].url, "https://blog.example/ca-phe-trung");
}

#[tokio::test]
async fn test_malformed_tokens_return_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    for query in ["\"", "***", "phở \"(", "AND OR NOT", "c++ ^"] {
        let results = search(&store, query, &SearchParams::default()).await;
        assert!(results.is_ok(), "query {:?} errored", query);
    }

    let results = search(&store, "cà phê ???", &SearchParams::default())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_page_size_caps_results() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    for i in 0..5 {
        put(
            &store,
            &format!("bun-{}", i),
            "Bún chả",
            "bún chả Hà Nội",
            &format!("2024-01-0{}T00:00:00Z", i + 1),
        )
        .await;
    }

    let params = SearchParams {
        page_size: 3,
        recent_limit: 3,
    };
    let results = search(&store, "bun cha", &params).await.unwrap();
    assert_eq!(results.len(), 3);
    // Equal relevance falls back to newest first.
    assert_eq!(results[0].url, "https://blog.example/bun-4");
}

#[tokio::test]
async fn test_updates_replace_search_vector() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    put(&store, "x", "Bánh xèo", "miền Tây", "2024-01-01T00:00:00Z").await;
    put(&store, "x", "Bánh cuốn", "Thanh Trì", "2024-02-01T00:00:00Z").await;

    let old = search(&store, "xeo", &SearchParams::default())
        .await
        .unwrap();
    assert!(old.is_empty());

    let new = search(&store, "banh cuon", &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(urls(&new), vec!["https://blog.example/x"]);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleted_articles_leave_the_index() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    seed_vietnamese(&store).await;

    let removed = store
        .delete_by_urls(&["https://blog.example/pho-bo".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let results = search(&store, "pho", &SearchParams::default())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_d_stroke_matches_plain_d() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    put(
        &store,
        "duong-den-truong",
        "Đường đến trường",
        "Mỗi sáng đi bộ qua cầu.",
        "2024-04-01T07:00:00+07:00",
    )
    .await;

    for query in ["đường", "duong", "DEN", "Đường đến"] {
        let results = search(&store, query, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(
            urls(&results),
            vec!["https://blog.example/duong-den-truong"],
            "query {:?}",
            query
        );
    }

    let results = search(&store, "duong", &SearchParams::default())
        .await
        .unwrap();
    assert!(results[0].snippet.contains("<strong>"));
}
