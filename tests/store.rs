use memex::config::Config;
use memex::models::Category;
use memex::store::sqlite::SqliteStore;
use memex::store::{MemoryRecord, RatingStats, SearchQuery, Store};
use tempfile::TempDir;

fn record(id: &str, content: &str, importance: i64, timestamp: i64) -> MemoryRecord {
    MemoryRecord {
        id: id.to_string(),
        category: "SYSTEM-LEARNING".to_string(),
        title: "Backpressure".to_string(),
        content: content.to_string(),
        topic: "Backpressure".to_string(),
        tags: vec!["queues".to_string()],
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

async fn open_store(tmp: &TempDir) -> SqliteStore {
    SqliteStore::open(&Config::for_root(tmp.path())).await.unwrap()
}

fn query(text: &str) -> SearchQuery {
    SearchQuery {
        text: text.to_string(),
        limit: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn upsert_twice_keeps_one_record_with_latest_fields() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert_memory(&record("a", "bounded channels apply backpressure", 3, 100))
        .await
        .unwrap();
    let mut second = record("a", "unbounded queues hide overload", 4, 200);
    second.rating = Some(7);
    store.upsert_memory(&second).await.unwrap();

    assert_eq!(store.stats().await.unwrap().total, 1);
    let stored = store.get_memory("a").await.unwrap().unwrap();
    assert_eq!(stored.content, "unbounded queues hide overload");
    assert_eq!(stored.rating, Some(7));
    assert_eq!(stored.importance, 4);

    // The full-text entry was replaced too.
    assert!(store.search(&query("bounded")).await.unwrap().is_empty());
    assert_eq!(store.search(&query("overload")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn equal_rank_orders_by_importance_before_recency() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert_memory(&record("older", "retry with jitter", 5, 1_000))
        .await
        .unwrap();
    store
        .upsert_memory(&record("newer", "retry with jitter", 3, 2_000))
        .await
        .unwrap();

    let hits = store.search(&query("jitter")).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["older", "newer"]);
}

#[tokio::test]
async fn query_syntax_is_treated_as_text() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store
        .upsert_memory(&record("a", "retry with jitter", 3, 1))
        .await
        .unwrap();

    let hits = store.search(&query("\"jitter\" OR (")).await;
    assert!(hits.is_ok());
}

#[tokio::test]
async fn category_filter_excludes_other_categories() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert_memory(&record("sys", "retry with jitter", 3, 1))
        .await
        .unwrap();
    let mut journal = record("jrn", "retry with jitter", 3, 1);
    journal.category = "JOURNAL-ENTRY".to_string();
    store.upsert_memory(&journal).await.unwrap();

    let hits = store
        .search(&SearchQuery {
            category: Some(Category::JournalEntry),
            ..query("jitter")
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "jrn");
}

#[tokio::test]
async fn stats_without_ratings() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store
        .upsert_memory(&record("a", "retry with jitter", 3, 1))
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.by_category, vec![("SYSTEM-LEARNING".to_string(), 1)]);
    assert_eq!(stats.ratings, RatingStats::default());
}

#[tokio::test]
async fn delete_removes_record_and_index_entry() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store
        .upsert_memory(&record("a", "retry with jitter", 3, 1))
        .await
        .unwrap();

    assert!(store.delete_memory("a").await.unwrap());
    assert!(!store.delete_memory("a").await.unwrap());
    assert!(store.search(&query("jitter")).await.unwrap().is_empty());
}
