//! Vault → index synchronization.
//!
//! Walks every category subtree, reads each memory, and upserts it into the
//! [`Store`] by identity. Sync is incremental by modification time unless a
//! full sync is requested. Records whose backing file no longer exists are
//! pruned on every non-dry-run sync.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::Category;
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::store::sqlite::SqliteStore;
use crate::store::{MemoryRecord, Store};
use crate::vault::{list_files, read_memory};

const CHECKPOINT_SOURCE: &str = "vault";

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Ignore the checkpoint and re-read every file.
    pub full: bool,
    pub dry_run: bool,
    /// Only files modified on or after this date (YYYY-MM-DD).
    pub since: Option<String>,
    /// Only files modified on or before this date (YYYY-MM-DD).
    pub until: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched: u64,
    pub upserted: u64,
    pub skipped: u64,
    pub pruned: u64,
    pub checkpoint: i64,
}

fn parse_day(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid --{} date '{}': expected YYYY-MM-DD", flag, s))
}

/// Sync the vault into `store`.
pub async fn sync_vault(
    config: &Config,
    store: &dyn Store,
    opts: &SyncOptions,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncSummary> {
    let since_ts = match opts.since.as_deref() {
        Some(s) => Some(parse_day(s, "since")?.and_time(NaiveTime::MIN).and_utc()),
        None => None,
    };
    let until_ts = match opts.until.as_deref() {
        Some(s) => {
            let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
            Some(parse_day(s, "until")?.and_time(end).and_utc())
        }
        None => None,
    };

    let checkpoint = if opts.full {
        None
    } else {
        store.get_checkpoint(CHECKPOINT_SOURCE).await?
    };

    progress.report(SyncProgressEvent::Discovering);
    let mut files = list_files(config, &Category::ALL)?;

    // Files saved in the checkpoint's own second are re-read; upserts are
    // idempotent.
    if let Some(cp) = checkpoint {
        files.retain(|f| f.modified.map_or(true, |m| m.timestamp() >= cp));
    }

    // Oldest first, so `--until` and `--limit` only ever hold back files
    // newer than everything processed, which the next sync still sees.
    files.sort_by_key(|f| f.modified);

    let candidates = files.len();
    if let Some(since) = since_ts {
        files.retain(|f| f.modified.map_or(true, |m| m >= since));
    }
    // Skipping older files means the checkpoint must not move past them.
    let advance_checkpoint = files.len() == candidates;

    if let Some(until) = until_ts {
        files.retain(|f| f.modified.map_or(true, |m| m <= until));
    }
    if let Some(lim) = opts.limit {
        files.truncate(lim);
    }

    let mut summary = SyncSummary {
        fetched: files.len() as u64,
        checkpoint: checkpoint.unwrap_or(0),
        ..Default::default()
    };

    if opts.dry_run {
        return Ok(summary);
    }

    let now = Utc::now();
    let total = files.len() as u64;
    for (i, file) in files.iter().enumerate() {
        match read_memory(config, file, now) {
            Ok(memory) => {
                store.upsert_memory(&MemoryRecord::from_memory(&memory)).await?;
                summary.upserted += 1;
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "skipping unreadable memory");
                summary.skipped += 1;
            }
        }

        if advance_checkpoint {
            if let Some(m) = file.modified {
                summary.checkpoint = summary.checkpoint.max(m.timestamp());
            }
        }
        progress.report(SyncProgressEvent::Indexing {
            n: i as u64 + 1,
            total,
        });
    }

    summary.pruned = prune_missing(store).await?;
    if summary.pruned > 0 {
        progress.report(SyncProgressEvent::Pruning {
            removed: summary.pruned,
        });
    }

    store
        .set_checkpoint(CHECKPOINT_SOURCE, summary.checkpoint)
        .await?;

    info!(
        fetched = summary.fetched,
        upserted = summary.upserted,
        pruned = summary.pruned,
        "sync complete"
    );
    Ok(summary)
}

/// Delete records whose backing file no longer exists.
pub async fn prune_missing(store: &dyn Store) -> Result<u64> {
    let mut removed = 0;
    for (id, file_path) in store.list_locations().await? {
        if !Path::new(&file_path).exists() && store.delete_memory(&id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// CLI entry point for `memex sync`.
pub async fn run_sync(
    config: &Config,
    opts: SyncOptions,
    progress: &dyn SyncProgressReporter,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let summary = sync_vault(config, &store, &opts, progress).await?;
    store.close().await;

    if opts.dry_run {
        println!("sync (dry-run)");
        println!("  memories found: {}", summary.fetched);
        return Ok(());
    }

    println!("sync");
    println!("  fetched: {} memories", summary.fetched);
    println!("  upserted: {}", summary.upserted);
    println!("  skipped: {}", summary.skipped);
    println!("  pruned: {}", summary.pruned);
    println!("  checkpoint: {}", summary.checkpoint);
    println!("ok");
    Ok(())
}
