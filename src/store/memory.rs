//! In-memory [`Store`] implementation for tests and throwaway indexes.
//!
//! Uses `BTreeMap` behind `std::sync::RwLock`. Relevance is the total number
//! of term occurrences across content, topic, and tags; a record must
//! contain every query term to match.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::SearchHit;

use super::{excerpt, query_terms, IndexStats, MemoryRecord, RatingStats, SearchQuery, Store};

/// In-memory store keyed by identity.
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, MemoryRecord>>,
    checkpoints: RwLock<HashMap<String, i64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            checkpoints: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

fn relevance(record: &MemoryRecord, terms: &[String]) -> Option<f64> {
    let haystack = format!(
        "{}\n{}\n{}",
        record.content,
        record.topic,
        record.tags.join(" ")
    )
    .to_lowercase();

    let mut total = 0usize;
    for term in terms {
        let n = haystack.matches(term.as_str()).count();
        if n == 0 {
            return None;
        }
        total += n;
    }
    Some(total as f64)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_memory(&self, record: &MemoryRecord) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete_memory(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.remove(id).is_some())
    }

    async fn get_memory(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<(String, String)>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .values()
            .map(|r| (r.id.clone(), r.file_path.clone()))
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let terms = query_terms(&query.text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.records.read().map_err(poisoned)?;
        let mut hits: Vec<SearchHit> = records
            .values()
            .filter(|r| {
                query
                    .category
                    .map_or(true, |c| r.category == c.as_str())
            })
            .filter(|r| query.since.map_or(true, |since| r.timestamp >= since))
            .filter_map(|r| {
                relevance(r, &terms).map(|score| SearchHit {
                    id: r.id.clone(),
                    title: r.title.clone(),
                    category: r.category.clone(),
                    file_path: r.file_path.clone(),
                    timestamp: r.timestamp,
                    importance: r.importance,
                    rating: r.rating,
                    score,
                    snippet: excerpt(&r.content, 160),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.importance.cmp(&a.importance))
                .then(b.timestamp.cmp(&a.timestamp))
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(query.limit.max(0) as usize);
        Ok(hits)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let records = self.records.read().map_err(poisoned)?;

        let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
        for r in records.values() {
            *by_category.entry(r.category.clone()).or_default() += 1;
        }

        let ratings: Vec<i64> = records.values().filter_map(|r| r.rating).collect();
        let rating_stats = RatingStats {
            count: ratings.len() as i64,
            mean: if ratings.is_empty() {
                None
            } else {
                Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64)
            },
            min: ratings.iter().copied().min(),
            max: ratings.iter().copied().max(),
        };

        Ok(IndexStats {
            total: records.len() as i64,
            by_category: by_category.into_iter().collect(),
            ratings: rating_stats,
        })
    }

    async fn get_checkpoint(&self, source: &str) -> Result<Option<i64>> {
        let checkpoints = self.checkpoints.read().map_err(poisoned)?;
        Ok(checkpoints.get(source).copied())
    }

    async fn set_checkpoint(&self, source: &str, cursor: i64) -> Result<()> {
        let mut checkpoints = self.checkpoints.write().map_err(poisoned)?;
        checkpoints.insert(source.to_string(), cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str, importance: i64, timestamp: i64) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            category: "SYSTEM-LEARNING".to_string(),
            title: format!("Note {}", id),
            content: content.to_string(),
            topic: format!("Note {}", id),
            tags: Vec::new(),
            rating: None,
            importance,
            stability: 3,
            timestamp,
            file_path: format!("/vault/{}.md", id),
            relative_path: format!("{}.md", id),
            content_hash: String::new(),
            updated_at: timestamp,
        }
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery {
            text: text.to_string(),
            limit: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn equal_relevance_breaks_ties_on_importance_then_recency() {
        let store = InMemoryStore::new();
        store.upsert_memory(&record("a", "tokio runtime", 3, 200)).await.unwrap();
        store.upsert_memory(&record("b", "tokio runtime", 5, 100)).await.unwrap();
        store.upsert_memory(&record("c", "tokio runtime", 3, 300)).await.unwrap();

        let hits = store.search(&query("tokio")).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn every_term_must_match() {
        let store = InMemoryStore::new();
        store.upsert_memory(&record("a", "tokio runtime", 3, 1)).await.unwrap();
        store.upsert_memory(&record("b", "tokio only", 3, 1)).await.unwrap();
        let hits = store.search(&query("tokio runtime")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn stats_without_ratings_are_empty_not_errors() {
        let store = InMemoryStore::new();
        store.upsert_memory(&record("a", "x", 3, 1)).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.ratings, RatingStats::default());
    }
}
