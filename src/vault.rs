//! Vault enumeration and memory loading.
//!
//! The vault root holds one subtree per [`Category`], partitioned into
//! `YYYY-MM` month directories of markdown files. Work sessions may instead
//! be timestamped directories holding a `summary.md` (plus an `IDEAL.md` and
//! a metadata file, which are not memories themselves).
//!
//! Unreadable files are logged and skipped; they never abort a batch.

use anyhow::Result;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::extract;
use crate::models::{Category, Memory};

static MONTH_DIR: OnceLock<Regex> = OnceLock::new();

fn month_dir_re() -> &'static Regex {
    MONTH_DIR.get_or_init(|| Regex::new(r"^\d{4}-\d{2}$").expect("month regex is valid"))
}

/// Inclusive modification-time window.
#[derive(Debug, Clone, Copy)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// A markdown file discovered in the vault, not yet read.
#[derive(Debug, Clone)]
pub struct VaultFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub category: Category,
    pub modified: Option<DateTime<Utc>>,
}

/// Stable identity for a vault-relative path.
pub fn memory_id(relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Enumerate memory files for the given categories.
///
/// Categories are visited in the order given, month directories in name
/// order, files in name order.
pub fn list_files(config: &Config, categories: &[Category]) -> Result<Vec<VaultFile>> {
    let root = &config.vault.root;
    let mut excludes = vec!["**/.git/**".to_string(), "**/.memex/**".to_string()];
    excludes.extend(config.vault.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();

    for category in categories {
        let category_dir = root.join(category.dir());
        if !category_dir.is_dir() {
            debug!(category = %category, dir = %category_dir.display(), "category directory missing");
            continue;
        }

        let mut months: Vec<PathBuf> = match std::fs::read_dir(&category_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter(|e| month_dir_re().is_match(&e.file_name().to_string_lossy()))
                .map(|e| e.path())
                .collect(),
            Err(e) => {
                warn!(dir = %category_dir.display(), error = %e, "skipping unreadable category directory");
                continue;
            }
        };
        months.sort();

        for month in months {
            let walker = WalkDir::new(&month)
                .min_depth(1)
                .max_depth(2)
                .follow_links(config.vault.follow_symlinks)
                .sort_by_file_name();

            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable vault entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !is_memory_file(entry.path(), entry.depth()) {
                    continue;
                }

                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(path);
                let rel_str = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if exclude_set.is_match(&rel_str) {
                    continue;
                }

                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from);

                files.push(VaultFile {
                    path: path.to_path_buf(),
                    relative_path: rel_str,
                    category: *category,
                    modified,
                });
            }
        }
    }

    Ok(files)
}

/// Markdown files directly in a month directory, or a session directory's
/// `summary.md` one level down.
fn is_memory_file(path: &Path, depth: usize) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !name.to_ascii_lowercase().ends_with(".md") {
        return false;
    }
    match depth {
        1 => name != "IDEAL.md",
        2 => name == "summary.md",
        _ => false,
    }
}

/// Read one vault file into a [`Memory`].
pub fn read_memory(config: &Config, file: &VaultFile, now: DateTime<Utc>) -> Result<Memory> {
    let raw = std::fs::read_to_string(&file.path)?;

    let title = extract::extract_title(&raw).unwrap_or_else(|| extract::slug_title(&file.path));
    let rating = extract::extract_rating(&raw);
    let tags = extract::extract_tags(&raw);
    let timestamp = extract::resolve_timestamp(&file.relative_path, file.modified, now);
    let body = extract::truncate_body(&raw, file.category, &config.truncation);

    Ok(Memory {
        id: memory_id(&file.relative_path),
        path: file.path.clone(),
        relative_path: file.relative_path.clone(),
        category: file.category,
        title,
        date: timestamp.format("%Y-%m-%d").to_string(),
        timestamp,
        modified: file.modified.unwrap_or(now),
        body,
        rating,
        tags,
        importance: extract::importance(rating, file.category),
        stability: extract::stability(&file.relative_path, file.category),
    })
}

/// Load memories whose modification time falls inside `range`.
///
/// Unreadable files are skipped with a warning. The result is sorted by
/// resolved date, ascending; equal dates keep enumeration order.
pub fn load_memories(
    config: &Config,
    categories: &[Category],
    range: Option<&TimeRange>,
) -> Result<Vec<Memory>> {
    let now = Utc::now();
    let mut memories = Vec::new();

    for file in list_files(config, categories)? {
        if let Some(range) = range {
            match file.modified {
                Some(ts) if range.contains(ts) => {}
                _ => continue,
            }
        }

        match read_memory(config, &file, now) {
            Ok(m) => memories.push(m),
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "skipping unreadable memory");
            }
        }
    }

    memories.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(memories)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
