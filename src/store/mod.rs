//! Storage abstraction for the memory index.
//!
//! The [`Store`] trait holds one record per memory, keyed by identity, with
//! a full-text index over content, topic, and tags. Two backends exist:
//! [`SqliteStore`](sqlite::SqliteStore) (persistent, FTS5) and
//! [`InMemoryStore`](memory::InMemoryStore) (tests and throwaway indexes).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{Category, Memory, SearchHit};

/// The stored form of a [`Memory`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub id: String,
    pub category: String,
    pub title: String,
    pub content: String,
    /// Subject line indexed alongside the content. Currently the title.
    pub topic: String,
    pub tags: Vec<String>,
    pub rating: Option<i64>,
    pub importance: i64,
    pub stability: i64,
    pub timestamp: i64,
    pub file_path: String,
    pub relative_path: String,
    pub content_hash: String,
    pub updated_at: i64,
}

impl MemoryRecord {
    pub fn from_memory(memory: &Memory) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(memory.body.as_bytes());
        let content_hash = format!("{:x}", hasher.finalize());

        Self {
            id: memory.id.clone(),
            category: memory.category.as_str().to_string(),
            title: memory.title.clone(),
            content: memory.body.clone(),
            topic: memory.title.clone(),
            tags: memory.tags.clone(),
            rating: memory.rating.map(i64::from),
            importance: i64::from(memory.importance),
            stability: i64::from(memory.stability),
            timestamp: memory.timestamp.timestamp(),
            file_path: memory.path.display().to_string(),
            relative_path: memory.relative_path.clone(),
            content_hash,
            updated_at: memory.modified.timestamp(),
        }
    }
}

/// A ranked lookup against the index.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub limit: i64,
    pub category: Option<Category>,
    /// Only records with `timestamp >= since` (Unix seconds).
    pub since: Option<i64>,
}

/// Rating distribution over rated records. All fields are empty when no
/// record carries a rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingStats {
    pub count: i64,
    pub mean: Option<f64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub total: i64,
    /// `(category, count)`, sorted by category name.
    pub by_category: Vec<(String, i64)>,
    pub ratings: RatingStats,
}

/// Abstract storage backend for the memory index.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_memory`](Store::upsert_memory) | Insert or replace a record and its index entry |
/// | [`delete_memory`](Store::delete_memory) | Remove a record and its index entry |
/// | [`get_memory`](Store::get_memory) | Fetch one record by identity |
/// | [`list_locations`](Store::list_locations) | Identity and file path of every record |
/// | [`search`](Store::search) | Ranked full-text lookup |
/// | [`stats`](Store::stats) | Totals and rating distribution |
/// | [`get_checkpoint`](Store::get_checkpoint) | Incremental-sync cursor |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or update by identity. Every field and the full-text entry are
    /// replaced together; the last write wins.
    async fn upsert_memory(&self, record: &MemoryRecord) -> Result<()>;

    /// Returns whether a record was removed.
    async fn delete_memory(&self, id: &str) -> Result<bool>;

    async fn get_memory(&self, id: &str) -> Result<Option<MemoryRecord>>;

    /// `(id, file_path)` for every record, ordered by id.
    async fn list_locations(&self) -> Result<Vec<(String, String)>>;

    /// Ranked by relevance, then importance descending, then timestamp
    /// descending.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;

    async fn stats(&self) -> Result<IndexStats>;

    async fn get_checkpoint(&self, source: &str) -> Result<Option<i64>>;

    async fn set_checkpoint(&self, source: &str, cursor: i64) -> Result<()>;
}

/// Split a free-text query into lower-cased search terms.
///
/// Anything that is not alphanumeric or `_` separates terms, so query text
/// can never be interpreted as index syntax.
pub fn query_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// First `max_chars` characters of `text`, on one line.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .collect::<String>()
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_terms_strip_syntax() {
        assert_eq!(query_terms("Rust  \"borrow-checker\" OR*"), vec!["rust", "borrow", "checker", "or"]);
        assert!(query_terms("  -- ").is_empty());
    }

    #[test]
    fn excerpt_flattens_newlines() {
        assert_eq!(excerpt("a\nb\nc", 3), "a b");
    }
}
