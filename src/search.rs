//! Search entry points.
//!
//! `index` mode queries the [`Store`]'s full-text index; `scan` mode reads
//! the vault directly through [`crate::scan`], which needs no index and is
//! never stale.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};

use crate::config::Config;
use crate::models::{Category, SearchHit};
use crate::scan::{scan_vault, ScanOptions};
use crate::store::sqlite::SqliteStore;
use crate::store::{SearchQuery, Store};

/// Parsed and validated search filters shared by both modes.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub category: Option<Category>,
    pub since: Option<NaiveDate>,
    pub limit: Option<i64>,
}

impl SearchFilters {
    /// Validate raw CLI input. Unknown categories and malformed dates are
    /// errors, never guesses.
    pub fn parse(
        category: Option<&str>,
        since: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Self> {
        let category = category.map(|c| c.parse::<Category>()).transpose()?;
        let since = since
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("Invalid --since date '{}': expected YYYY-MM-DD", s))
            })
            .transpose()?;
        if let Some(l) = limit {
            if l < 1 {
                bail!("--limit must be >= 1");
            }
        }
        Ok(Self {
            category,
            since,
            limit,
        })
    }
}

/// Ranked lookup against the index store.
pub async fn search_index(
    config: &Config,
    store: &dyn Store,
    query: &str,
    filters: &SearchFilters,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        bail!("Search query must not be empty");
    }
    let q = SearchQuery {
        text: query.to_string(),
        limit: filters.limit.unwrap_or(config.retrieval.final_limit),
        category: filters.category,
        since: filters
            .since
            .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp()),
    };
    store.search(&q).await
}

/// CLI entry point for `memex search`.
pub async fn run_search(
    config: &Config,
    query: &str,
    mode: &str,
    filters: SearchFilters,
    literal: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Search query must not be empty");
    }

    match mode {
        "index" => {
            if literal {
                bail!("--literal only applies to --mode scan");
            }
            let store = SqliteStore::open(config).await?;
            let hits = search_index(config, &store, query, &filters).await?;
            store.close().await;
            print_hits(&hits);
        }
        "scan" => {
            let opts = ScanOptions {
                category: filters.category,
                since: filters.since,
                literal,
                context_lines: config.scan.context_lines,
                limit: filters.limit.map(|l| l as usize),
            };
            let results = scan_vault(config, query, &opts)?;
            crate::scan::print_results(&results);
        }
        _ => bail!("Unknown search mode: {}. Use index or scan.", mode),
    }

    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(hit.timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        println!("{}. [{:.2}] {} / {}", i + 1, hit.score, hit.category, hit.title);
        println!("    date: {}", date);
        println!("    importance: {}", hit.importance);
        if let Some(r) = hit.rating {
            println!("    rating: {}/10", r);
        }
        println!("    path: {}", hit.file_path);
        println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
        println!("    id: {}", hit.id);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::MemoryRecord;
    use std::path::Path;

    #[test]
    fn filters_reject_bad_input() {
        assert!(SearchFilters::parse(Some("recipes"), None, None).is_err());
        assert!(SearchFilters::parse(None, Some("10/14/2026"), None).is_err());
        assert!(SearchFilters::parse(None, None, Some(0)).is_err());
        let ok = SearchFilters::parse(Some("journal-entry"), Some("2026-10-01"), Some(3)).unwrap();
        assert_eq!(ok.category, Some(Category::JournalEntry));
        assert_eq!(ok.since.unwrap().to_string(), "2026-10-01");
    }

    #[tokio::test]
    async fn empty_query_is_an_error() {
        let cfg = Config::for_root(Path::new("/vault"));
        let store = InMemoryStore::new();
        let err = search_index(&cfg, &store, "   ", &SearchFilters::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn since_filter_uses_record_timestamp() {
        let cfg = Config::for_root(Path::new("/vault"));
        let store = InMemoryStore::new();
        for (id, ts) in [("old", 1_600_000_000), ("new", 1_800_000_000)] {
            store
                .upsert_memory(&MemoryRecord {
                    id: id.to_string(),
                    category: "JOURNAL-ENTRY".to_string(),
                    title: id.to_string(),
                    content: "espresso notes".to_string(),
                    topic: id.to_string(),
                    tags: Vec::new(),
                    rating: None,
                    importance: 2,
                    stability: 3,
                    timestamp: ts,
                    file_path: format!("/vault/{}.md", id),
                    relative_path: format!("{}.md", id),
                    content_hash: String::new(),
                    updated_at: ts,
                })
                .await
                .unwrap();
        }
        let filters = SearchFilters::parse(None, Some("2025-01-01"), None).unwrap();
        let hits = search_index(&cfg, &store, "espresso", &filters).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "new");
    }
}
