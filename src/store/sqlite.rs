//! SQLite-backed [`Store`] implementation.
//!
//! Records live in `memories`; the full-text index is the FTS5 table
//! `memories_fts` over content, topic, and tags, ranked with `bm25()`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::SearchHit;

use super::{query_terms, IndexStats, MemoryRecord, RatingStats, SearchQuery, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating and migrating it if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Build an FTS5 MATCH expression: every term quoted, prefix-matched, ANDed.
fn fts_query(text: &str) -> Option<String> {
    let terms = query_terms(text);
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn record_from_row(row: &SqliteRow) -> MemoryRecord {
    let tags: String = row.get("tags");
    MemoryRecord {
        id: row.get("id"),
        category: row.get("category"),
        title: row.get("title"),
        content: row.get("content"),
        topic: row.get("topic"),
        tags: tags.split_whitespace().map(|t| t.to_string()).collect(),
        rating: row.get("rating"),
        importance: row.get("importance"),
        stability: row.get("stability"),
        timestamp: row.get("timestamp"),
        file_path: row.get("file_path"),
        relative_path: row.get("relative_path"),
        content_hash: row.get("content_hash"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_memory(&self, record: &MemoryRecord) -> Result<()> {
        let tags = record.tags.join(" ");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO memories (id, category, title, content, topic, tags, rating,
                                  importance, stability, timestamp, file_path,
                                  relative_path, content_hash, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                category = excluded.category,
                title = excluded.title,
                content = excluded.content,
                topic = excluded.topic,
                tags = excluded.tags,
                rating = excluded.rating,
                importance = excluded.importance,
                stability = excluded.stability,
                timestamp = excluded.timestamp,
                file_path = excluded.file_path,
                relative_path = excluded.relative_path,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.category)
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.topic)
        .bind(&tags)
        .bind(record.rating)
        .bind(record.importance)
        .bind(record.stability)
        .bind(record.timestamp)
        .bind(&record.file_path)
        .bind(&record.relative_path)
        .bind(&record.content_hash)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM memories_fts WHERE id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO memories_fts (id, content, topic, tags) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.content)
            .bind(&record.topic)
            .bind(&tags)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_memory(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM memories_fts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM memories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn get_memory(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let row = sqlx::query("SELECT * FROM memories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn list_locations(&self) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query("SELECT id, file_path FROM memories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("id"), row.get("file_path")))
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let Some(match_expr) = fts_query(&query.text) else {
            return Ok(Vec::new());
        };
        let category = query.category.map(|c| c.as_str());

        let rows = sqlx::query(
            r#"
            SELECT m.id, m.title, m.category, m.file_path, m.timestamp,
                   m.importance, m.rating,
                   bm25(memories_fts) AS rank,
                   snippet(memories_fts, 1, '>>>', '<<<', '...', 24) AS snippet
            FROM memories_fts
            JOIN memories m ON m.id = memories_fts.id
            WHERE memories_fts MATCH ?
              AND (? IS NULL OR m.category = ?)
              AND (? IS NULL OR m.timestamp >= ?)
            ORDER BY rank ASC, m.importance DESC, m.timestamp DESC, m.id ASC
            LIMIT ?
            "#,
        )
        .bind(&match_expr)
        .bind(category)
        .bind(category)
        .bind(query.since)
        .bind(query.since)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let rank: f64 = row.get("rank");
                SearchHit {
                    id: row.get("id"),
                    title: row.get("title"),
                    category: row.get("category"),
                    file_path: row.get("file_path"),
                    timestamp: row.get("timestamp"),
                    importance: row.get("importance"),
                    rating: row.get("rating"),
                    score: -rank, // negate so higher = better
                    snippet: row.get("snippet"),
                }
            })
            .collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memories")
            .fetch_one(&self.pool)
            .await?;

        let by_category: Vec<(String, i64)> = sqlx::query(
            "SELECT category, COUNT(*) AS n FROM memories GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| (row.get("category"), row.get("n")))
        .collect();

        let row = sqlx::query(
            r#"
            SELECT COUNT(rating) AS n,
                   AVG(rating) AS mean,
                   MIN(rating) AS lo,
                   MAX(rating) AS hi
            FROM memories
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(IndexStats {
            total,
            by_category,
            ratings: RatingStats {
                count: row.get("n"),
                mean: row.get("mean"),
                min: row.get("lo"),
                max: row.get("hi"),
            },
        })
    }

    async fn get_checkpoint(&self, source: &str) -> Result<Option<i64>> {
        let result: Option<String> =
            sqlx::query_scalar("SELECT cursor FROM checkpoints WHERE source = ?")
                .bind(source)
                .fetch_optional(&self.pool)
                .await?;

        Ok(result.and_then(|s| s.parse::<i64>().ok()))
    }

    async fn set_checkpoint(&self, source: &str, cursor: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO checkpoints (source, cursor, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(source) DO UPDATE SET cursor = excluded.cursor, updated_at = excluded.updated_at
            "#,
        )
        .bind(source)
        .bind(cursor.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
