//! Linear search over raw vault files.
//!
//! Bypasses the index entirely: every candidate file is read and matched
//! line by line with one case-insensitive pattern. Useful when the index is
//! stale or has never been built.
//!
//! The query is compiled **as a regular expression**, not as literal text,
//! so `.`, `*`, `(` and friends change what matches. Pass `literal = true`
//! to escape the query first.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::extract;
use crate::models::Category;
use crate::vault::list_files;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub category: Option<Category>,
    /// Exclude files whose path date is strictly earlier. Files with no
    /// date in their path are never excluded.
    pub since: Option<NaiveDate>,
    pub literal: bool,
    pub context_lines: usize,
    pub limit: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            category: None,
            since: None,
            literal: false,
            context_lines: 3,
            limit: None,
        }
    }
}

/// One matching line with the lines around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based line number of the matching line.
    pub line_number: usize,
    /// 1-based line number of `context[0]`.
    pub context_start: usize,
    pub context: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanHit {
    pub relative_path: String,
    pub category: Category,
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Total pattern matches across all lines, not matching-line count.
    pub score: usize,
    pub matches: Vec<LineMatch>,
}

/// Compile the query into a case-insensitive pattern.
pub fn build_pattern(query: &str, literal: bool) -> Result<Regex> {
    if query.trim().is_empty() {
        bail!("Search query must not be empty");
    }
    let source = if literal {
        regex::escape(query)
    } else {
        query.to_string()
    };
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid search pattern '{}'", query))
}

/// Match `content` line by line. Returns the total match count and one
/// context window per matching line.
pub fn scan_text(pattern: &Regex, content: &str, context_lines: usize) -> (usize, Vec<LineMatch>) {
    let lines: Vec<&str> = content.lines().collect();
    let mut score = 0;
    let mut matches = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let n = pattern.find_iter(line).count();
        if n == 0 {
            continue;
        }
        score += n;

        let start = i.saturating_sub(context_lines);
        let end = (i + context_lines).min(lines.len() - 1);
        matches.push(LineMatch {
            line_number: i + 1,
            context_start: start + 1,
            context: lines[start..=end].iter().map(|l| l.to_string()).collect(),
        });
    }

    (score, matches)
}

/// Scan the vault for `query`.
///
/// Results are sorted by score, descending; equal scores keep discovery
/// order. Unreadable files are logged and skipped.
pub fn scan_vault(config: &Config, query: &str, opts: &ScanOptions) -> Result<Vec<ScanHit>> {
    let pattern = build_pattern(query, opts.literal)?;
    let categories: Vec<Category> = match opts.category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };

    let mut hits = Vec::new();
    for file in list_files(config, &categories)? {
        let date = extract::date_from_path(&file.relative_path).map(|dt| dt.date());
        if let (Some(since), Some(d)) = (opts.since, date) {
            if d < since {
                continue;
            }
        }

        let content = match std::fs::read_to_string(&file.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        let (score, matches) = scan_text(&pattern, &content, opts.context_lines);
        if score == 0 {
            continue;
        }

        hits.push(ScanHit {
            title: extract::extract_title(&content)
                .unwrap_or_else(|| extract::slug_title(&file.path)),
            relative_path: file.relative_path,
            category: file.category,
            date,
            score,
            matches,
        });
    }

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    if let Some(limit) = opts.limit {
        hits.truncate(limit);
    }
    Ok(hits)
}

pub fn print_results(hits: &[ScanHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        let date = hit
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "undated".to_string());
        println!(
            "{}. [{}] {} / {} ({})",
            i + 1,
            hit.score,
            hit.category,
            hit.title,
            date
        );
        println!("    path: {}", hit.relative_path);
        for m in &hit.matches {
            println!("    --- line {}", m.line_number);
            for (offset, line) in m.context.iter().enumerate() {
                let n = m.context_start + offset;
                let marker = if n == m.line_number { '>' } else { ' ' };
                println!("    {}{:>5} | {}", marker, n, line);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn score_counts_matches_not_lines() {
        let re = build_pattern("lock", false).unwrap();
        let (score, matches) = scan_text(&re, "lock then LOCK\nno\nunlock", 3);
        assert_eq!(score, 3);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn context_window_is_clamped() {
        let re = build_pattern("needle", false).unwrap();
        let body = "l1\nl2\nneedle\nl4\nl5\nl6\nl7\nl8";
        let (_, matches) = scan_text(&re, body, 3);
        assert_eq!(matches[0].line_number, 3);
        assert_eq!(matches[0].context_start, 1);
        assert_eq!(matches[0].context, vec!["l1", "l2", "needle", "l4", "l5", "l6"]);
    }

    #[test]
    fn query_is_a_pattern_unless_literal() {
        let body = "cache hit\ncache-miss";
        let re = build_pattern("cache.hit", false).unwrap();
        assert_eq!(scan_text(&re, body, 0).0, 1);

        let lit = build_pattern("cache.hit", true).unwrap();
        assert_eq!(scan_text(&lit, body, 0).0, 0);
    }

    #[test]
    fn invalid_pattern_and_empty_query_are_errors() {
        assert!(build_pattern("(unclosed", false).is_err());
        assert!(build_pattern("(unclosed", true).is_ok());
        assert!(build_pattern("  ", false).is_err());
    }

    #[test]
    fn results_sorted_by_score_with_stable_ties() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "journal/2026-10/2026-10-01-a.md", "# A\nrust");
        write(root, "journal/2026-10/2026-10-02-b.md", "# B\nrust rust\nrust");
        write(root, "journal/2026-10/2026-10-03-c.md", "# C\nrust");
        let cfg = Config::for_root(root);

        let hits = scan_vault(&cfg, "rust", &ScanOptions::default()).unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(hits[0].score, 3);
    }

    #[test]
    fn since_filter_passes_undated_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "journal/2026-09/2026-09-01-old.md", "# Old\nkafka");
        write(root, "journal/2026-10/2026-10-20-new.md", "# New\nkafka");
        write(root, "journal/2026-10/undated.md", "# Undated\nkafka");
        let cfg = Config::for_root(root);

        let opts = ScanOptions {
            since: NaiveDate::from_ymd_opt(2026, 10, 1),
            ..Default::default()
        };
        let hits = scan_vault(&cfg, "kafka", &opts).unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Undated"]);
    }

    #[test]
    fn category_filter_is_exact() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "journal/2026-10/j.md", "# J\nredis");
        write(root, "learnings/system/2026-10/s.md", "# S\nredis");
        let cfg = Config::for_root(root);

        let opts = ScanOptions {
            category: Some(Category::SystemLearning),
            ..Default::default()
        };
        let hits = scan_vault(&cfg, "redis", &opts).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "S");
    }
}
