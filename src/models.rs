//! Core data models used throughout memex.
//!
//! These types represent the memories, categories, and search hits that flow
//! through the sync, search, and synthesis pipelines.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The closed set of memory categories.
///
/// Each category owns one subtree of the vault, partitioned into `YYYY-MM`
/// month directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "ALGORITHM-LEARNING")]
    AlgorithmLearning,
    #[serde(rename = "SYSTEM-LEARNING")]
    SystemLearning,
    #[serde(rename = "WORK-SESSION")]
    WorkSession,
    #[serde(rename = "JOURNAL-ENTRY")]
    JournalEntry,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::AlgorithmLearning,
        Category::SystemLearning,
        Category::WorkSession,
        Category::JournalEntry,
    ];

    /// Categories that count as "learnings" for weekly synthesis.
    pub const LEARNINGS: [Category; 2] = [Category::AlgorithmLearning, Category::SystemLearning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AlgorithmLearning => "ALGORITHM-LEARNING",
            Category::SystemLearning => "SYSTEM-LEARNING",
            Category::WorkSession => "WORK-SESSION",
            Category::JournalEntry => "JOURNAL-ENTRY",
        }
    }

    /// Vault-relative directory holding this category's month partitions.
    pub fn dir(&self) -> &'static str {
        match self {
            Category::AlgorithmLearning => "learnings/algorithm",
            Category::SystemLearning => "learnings/system",
            Category::WorkSession => "sessions",
            Category::JournalEntry => "journal",
        }
    }

    /// Importance used when a memory carries no rating.
    pub fn default_importance(&self) -> u8 {
        match self {
            Category::AlgorithmLearning => 4,
            Category::SystemLearning => 3,
            Category::WorkSession => 3,
            Category::JournalEntry => 2,
        }
    }

    /// Stability used when no path rule applies.
    pub fn default_stability(&self) -> u8 {
        match self {
            Category::AlgorithmLearning => 4,
            Category::SystemLearning => 3,
            Category::WorkSession => 2,
            Category::JournalEntry => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase().replace('_', "-");
        match upper.as_str() {
            "ALGORITHM-LEARNING" => Ok(Category::AlgorithmLearning),
            "SYSTEM-LEARNING" => Ok(Category::SystemLearning),
            "WORK-SESSION" => Ok(Category::WorkSession),
            "JOURNAL-ENTRY" => Ok(Category::JournalEntry),
            _ => bail!(
                "Unknown category: '{}'. Must be one of ALGORITHM-LEARNING, SYSTEM-LEARNING, WORK-SESSION, JOURNAL-ENTRY.",
                s
            ),
        }
    }
}

/// One captured memory, read from a single markdown file in the vault.
#[derive(Debug, Clone)]
pub struct Memory {
    /// Stable identity derived from the vault-relative path.
    pub id: String,
    /// Absolute path of the backing file.
    pub path: PathBuf,
    /// Path relative to the vault root, with `/` separators.
    pub relative_path: String,
    pub category: Category,
    pub title: String,
    /// Resolved creation date, zero-padded `YYYY-MM-DD`.
    pub date: String,
    pub timestamp: DateTime<Utc>,
    /// File modification time.
    pub modified: DateTime<Utc>,
    pub body: String,
    pub rating: Option<u8>,
    pub tags: Vec<String>,
    pub importance: u8,
    pub stability: u8,
}

/// A ranked hit returned from the index store.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub category: String,
    pub file_path: String,
    pub timestamp: i64,
    pub importance: i64,
    pub rating: Option<i64>,
    /// Relevance score, higher is better.
    pub score: f64,
    pub snippet: String,
}
