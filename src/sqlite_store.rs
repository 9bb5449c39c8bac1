//! SQLite-backed [`ArticleStore`] implementation.
//!
//! Articles live in the `articles` table; their search vector lives in the
//! `articles_fts` FTS5 table. Every write touches both inside one
//! transaction, so the index never describes a title or body the row no
//! longer has.
//!
//! [`TextQuery`] is rendered into FTS5 syntax here and nowhere else: each
//! term is double-quoted and the terms are joined per the query's
//! [`TermJoin`]. The expression is bound as a parameter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use feed_mirror_core::models::{
    format_timestamp, ArticleStamp, ArticleUpsert, SearchHit, StoredArticle, UpsertOutcome,
};
use feed_mirror_core::query::{TermJoin, TextQuery};
use feed_mirror_core::store::ArticleStore;

/// FTS5 column weights for `bm25()`: article_id, title, content.
const BM25_WEIGHTS: &str = "0.0, 2.0, 1.0";

/// SQLite implementation of the [`ArticleStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Render a [`TextQuery`] as an FTS5 match expression.
pub fn fts5_expression(query: &TextQuery) -> String {
    let joiner = match query.join() {
        TermJoin::And => " AND ",
    };
    query
        .terms()
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(joiner)
}

fn parse_published(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("stored published_at is not RFC 3339: {}", raw))
}

fn hit_from_row(row: &SqliteRow, rank: f64) -> Result<SearchHit> {
    let published: String = row.get("published_at");
    Ok(SearchHit {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        content: row.get("content"),
        published_at: parse_published(&published)?,
        rank,
    })
}

fn is_fts_syntax_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message();
            msg.contains("fts5") || msg.contains("syntax error")
        }
        _ => false,
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn list_stamps(&self) -> Result<Vec<ArticleStamp>> {
        let rows = sqlx::query("SELECT url, published_at FROM articles")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let published: String = row.get("published_at");
                Ok(ArticleStamp {
                    url: row.get("url"),
                    published_at: parse_published(&published)?,
                })
            })
            .collect()
    }

    async fn delete_by_urls(&self, urls: &[String]) -> Result<u64> {
        if urls.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let mut fts_delete: QueryBuilder<Sqlite> = QueryBuilder::new(
            "DELETE FROM articles_fts WHERE article_id IN (SELECT id FROM articles WHERE url IN (",
        );
        {
            let mut list = fts_delete.separated(", ");
            for url in urls {
                list.push_bind(url);
            }
        }
        fts_delete.push("))");
        fts_delete.build().execute(&mut *tx).await?;

        let mut row_delete: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM articles WHERE url IN (");
        {
            let mut list = row_delete.separated(", ");
            for url in urls {
                list.push_bind(url);
            }
        }
        row_delete.push(")");
        let removed = row_delete.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;
        Ok(removed)
    }

    async fn upsert_article(&self, article: &ArticleUpsert) -> Result<UpsertOutcome> {
        let hash = article.content_hash();
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String, String)> =
            sqlx::query_as("SELECT id, content_hash FROM articles WHERE url = ?")
                .bind(&article.url)
                .fetch_optional(&mut *tx)
                .await?;

        let (id, outcome) = match existing {
            Some((_, stored_hash)) if stored_hash == hash => {
                tx.rollback().await?;
                return Ok(UpsertOutcome::Unchanged);
            }
            Some((id, _)) => (id, UpsertOutcome::Updated),
            None => (Uuid::new_v4().to_string(), UpsertOutcome::Inserted),
        };

        sqlx::query(
            r#"
            INSERT INTO articles (id, url, title, content, published_at, published_ts, content_hash, synced_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                published_at = excluded.published_at,
                published_ts = excluded.published_ts,
                content_hash = excluded.content_hash,
                synced_at = excluded.synced_at
            "#,
        )
        .bind(&id)
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.content)
        .bind(format_timestamp(&article.published_at))
        .bind(article.published_at.timestamp_millis())
        .bind(&hash)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        let vector = article.search_vector();

        sqlx::query("DELETE FROM articles_fts WHERE article_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO articles_fts (article_id, title, content) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&vector.title)
            .bind(&vector.content)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    async fn search(&self, query: &TextQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let expression = fts5_expression(query);

        let sql = format!(
            r#"
            SELECT a.id, a.title, a.url, a.content, a.published_at, f.relevance
            FROM (
                SELECT article_id, -bm25(articles_fts, {}) AS relevance
                FROM articles_fts
                WHERE articles_fts MATCH ?
            ) f
            JOIN articles a ON a.id = f.article_id
            ORDER BY f.relevance DESC, a.published_ts DESC
            LIMIT ?
            "#,
            BM25_WEIGHTS
        );

        let rows = match sqlx::query(&sql)
            .bind(&expression)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) if is_fts_syntax_error(&e) => {
                tracing::warn!(expression = %expression, error = %e, "full-text query rejected; returning no matches");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        rows.iter()
            .map(|row| {
                let relevance: f64 = row.get("relevance");
                hit_from_row(row, relevance)
            })
            .collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SearchHit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, url, content, published_at
            FROM articles
            ORDER BY published_ts DESC, url ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| hit_from_row(row, 0.0)).collect()
    }

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>> {
        let row = sqlx::query(
            "SELECT id, url, title, content, published_at FROM articles WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let published: String = r.get("published_at");
                Ok(Some(StoredArticle {
                    id: r.get("id"),
                    url: r.get("url"),
                    title: r.get("title"),
                    content: r.get("content"),
                    published_at: parse_published(&published)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}
