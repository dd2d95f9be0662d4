//! Memory retrieval by identity.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::store::sqlite::SqliteStore;
use crate::store::{MemoryRecord, Store};

/// Fetch one indexed memory. A missing identity is an error.
pub async fn get_memory(store: &dyn Store, id: &str) -> Result<MemoryRecord> {
    match store.get_memory(id).await? {
        Some(record) => Ok(record),
        None => bail!("memory not found: {}", id),
    }
}

/// CLI entry point for `memex get`.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result = get_memory(&store, id).await;
    store.close().await;
    let record = result?;

    println!("--- Memory ---");
    println!("id:           {}", record.id);
    println!("title:        {}", record.title);
    println!("category:     {}", record.category);
    println!("date:         {}", format_ts_iso(record.timestamp));
    println!("importance:   {}", record.importance);
    println!("stability:    {}", record.stability);
    if let Some(r) = record.rating {
        println!("rating:       {}/10", r);
    }
    if !record.tags.is_empty() {
        println!("tags:         {}", record.tags.join(", "));
    }
    println!("path:         {}", record.file_path);
    println!("updated_at:   {}", format_ts_iso(record.updated_at));
    println!();
    println!("--- Body ---");
    println!("{}", record.content);

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn missing_identity_is_an_error() {
        let store = InMemoryStore::new();
        let err = get_memory(&store, "deadbeefdeadbeef").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn timestamps_render_as_utc() {
        assert_eq!(format_ts_iso(0), "1970-01-01T00:00:00Z");
    }
}
