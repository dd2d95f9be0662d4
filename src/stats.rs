//! Index statistics.
//!
//! A quick summary of what's indexed: total memories, per-category counts,
//! and the rating distribution. Used by `memex stats` to confirm that syncs
//! are picking up what they should.

use anyhow::Result;

use crate::config::Config;
use crate::store::sqlite::SqliteStore;
use crate::store::{IndexStats, Store};

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let stats = store.stats().await?;
    let cursor = store.get_checkpoint("vault").await?;
    store.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("memex index stats");
    println!("=================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Last change: {}",
        cursor
            .filter(|ts| *ts > 0)
            .map(format_ts_relative)
            .unwrap_or_else(|| "never synced".to_string())
    );
    println!();
    print!("{}", render_counts(&stats));
    println!();
    Ok(())
}

/// Memory counts and rating distribution, one line each.
pub fn render_counts(stats: &IndexStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Memories:    {}\n", stats.total));

    if !stats.by_category.is_empty() {
        out.push('\n');
        out.push_str("  By category:\n");
        for (category, count) in &stats.by_category {
            out.push_str(&format!("  {:<20} {:>6}\n", category, count));
        }
    }

    out.push('\n');
    let r = &stats.ratings;
    match (r.mean, r.min, r.max) {
        (Some(mean), Some(min), Some(max)) => {
            out.push_str(&format!("  Rated:       {} / {}\n", r.count, stats.total));
            out.push_str(&format!("  Mean rating: {:.1}\n", mean));
            out.push_str(&format!("  Range:       {} - {}\n", min, max));
        }
        _ => out.push_str("  Rated:       none\n"),
    }
    out
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }
    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RatingStats;

    #[test]
    fn no_ratings_is_reported_not_computed() {
        let stats = IndexStats {
            total: 2,
            by_category: vec![("JOURNAL-ENTRY".to_string(), 2)],
            ratings: RatingStats::default(),
        };
        let out = render_counts(&stats);
        assert!(out.contains("Memories:    2"));
        assert!(out.contains("JOURNAL-ENTRY"));
        assert!(out.contains("Rated:       none"));
        assert!(!out.contains("Mean rating"));
    }

    #[test]
    fn rating_distribution_is_rendered() {
        let stats = IndexStats {
            total: 3,
            by_category: Vec::new(),
            ratings: RatingStats {
                count: 2,
                mean: Some(6.5),
                min: Some(4),
                max: Some(9),
            },
        };
        let out = render_counts(&stats);
        assert!(out.contains("Rated:       2 / 3"));
        assert!(out.contains("Mean rating: 6.5"));
        assert!(out.contains("Range:       4 - 9"));
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
