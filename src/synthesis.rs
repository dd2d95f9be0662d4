//! Weekly pattern synthesis.
//!
//! Runs the pipeline load → keywords → grouping → insights → report for one
//! Monday–Sunday week, writes the report, and folds the week into the
//! durable synthesis index.
//!
//! The index is a single-writer JSON document: it is read, modified in
//! memory, and rewritten whole. Two concurrent runs can lose an update.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::keywords::extract_keywords;
use crate::models::{Category, Memory};
use crate::patterns::{group_patterns, KeyedMemory};
use crate::report::WeeklyReport;
use crate::vault::{load_memories, TimeRange};

/// One recorded synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekRecord {
    pub start: String,
    pub end: String,
    pub learnings: usize,
    pub patterns: usize,
    pub file: String,
    /// Distinct-member count per theme detected this week.
    #[serde(default)]
    pub themes: BTreeMap<String, usize>,
}

/// Cumulative history of one theme across weeks.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThemeRecord {
    pub count: usize,
    pub weeks: Vec<String>,
}

/// Durable synthesis index: every week synthesized and every theme seen.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SynthesisIndex {
    #[serde(default)]
    pub weeks: Vec<WeekRecord>,
    #[serde(default)]
    pub patterns: BTreeMap<String, ThemeRecord>,
}

impl SynthesisIndex {
    /// Load the index. A missing or corrupt file yields an empty index;
    /// the corrupt file is left alone until the next successful save.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "synthesis index is corrupt, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write synthesis index: {}", path.display()))?;
        Ok(())
    }

    /// Fold one week into the index.
    ///
    /// Re-running a week replaces its record in place. The previous run's
    /// theme contributions are withdrawn first, so theme totals and week
    /// lists always reflect the latest run of every week.
    pub fn record_week(&mut self, mut record: WeekRecord, themes: &[(String, usize)]) {
        let week = record.start.clone();
        record.themes = themes.iter().cloned().collect();

        match self.weeks.iter().position(|w| w.start == week) {
            Some(i) => {
                let previous = std::mem::replace(&mut self.weeks[i], record);
                self.withdraw_week(&week, &previous.themes);
            }
            None => self.weeks.push(record),
        }

        for (theme, count) in themes {
            let entry = self.patterns.entry(theme.clone()).or_default();
            entry.count += count;
            if !entry.weeks.contains(&week) {
                entry.weeks.push(week.clone());
            }
        }
    }

    fn withdraw_week(&mut self, week: &str, themes: &BTreeMap<String, usize>) {
        for (theme, count) in themes {
            let Some(entry) = self.patterns.get_mut(theme) else {
                continue;
            };
            entry.count = entry.count.saturating_sub(*count);
            entry.weeks.retain(|w| w != week);
            if entry.weeks.is_empty() {
                self.patterns.remove(theme);
            }
        }
    }
}

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// Whole-day UTC window from the start of `start` to the end of `end`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> TimeRange {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    TimeRange {
        start: start.and_time(NaiveTime::MIN).and_utc(),
        end: end.and_time(last).and_utc(),
    }
}

/// Result of one synthesis run, before anything is written.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub memory_count: usize,
    /// `(theme, distinct count, insight)` in report order.
    pub patterns: Vec<(String, usize, String)>,
    pub low_rated: usize,
    pub report: String,
}

/// Run the pipeline over already-loaded memories.
pub fn synthesize_memories(
    config: &Config,
    start: NaiveDate,
    end: NaiveDate,
    memories: Vec<Memory>,
) -> Synthesis {
    let cfg = &config.synthesis;
    let keyed: Vec<KeyedMemory> = memories
        .into_iter()
        .map(|memory| {
            let keywords = extract_keywords(&memory.body, &cfg.vocabulary);
            KeyedMemory { memory, keywords }
        })
        .collect();

    let groups = group_patterns(&keyed, cfg.min_group_size);
    let flat: Vec<Memory> = keyed.iter().map(|k| k.memory.clone()).collect();

    let weekly = WeeklyReport {
        start,
        end,
        memories: &flat,
        groups: &groups,
    };
    let report = weekly.render(cfg);
    let low_rated = weekly.low_rated(cfg.low_rating_threshold).len();

    Synthesis {
        start,
        end,
        memory_count: flat.len(),
        patterns: groups
            .iter()
            .map(|g| (g.theme.clone(), g.count(), g.insight.clone()))
            .collect(),
        low_rated,
        report,
    }
}

/// Load the week's memories from the vault and synthesize them.
pub fn synthesize_week(
    config: &Config,
    categories: &[Category],
    date: NaiveDate,
) -> Result<Synthesis> {
    let (start, end) = week_bounds(date);
    let range = day_range(start, end);
    let memories = load_memories(config, categories, Some(&range))?;
    info!(%start, %end, memories = memories.len(), "synthesizing week");
    Ok(synthesize_memories(config, start, end, memories))
}

/// Report location for a week: `<output_dir>/YYYY-MM/weekly-<end>.md`.
pub fn report_path(config: &Config, end: NaiveDate) -> PathBuf {
    config
        .synthesis_dir()
        .join(end.format("%Y-%m").to_string())
        .join(format!("weekly-{}.md", end))
}

/// Write the report and record the week in the synthesis index.
pub fn write_synthesis(config: &Config, synthesis: &Synthesis) -> Result<PathBuf> {
    let path = report_path(config, synthesis.end);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &synthesis.report)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    let index_path = config.synthesis_index_path();
    let mut index = SynthesisIndex::load(&index_path);
    let themes: Vec<(String, usize)> = synthesis
        .patterns
        .iter()
        .map(|(theme, count, _)| (theme.clone(), *count))
        .collect();
    index.record_week(
        WeekRecord {
            start: synthesis.start.to_string(),
            end: synthesis.end.to_string(),
            learnings: synthesis.memory_count,
            patterns: synthesis.patterns.len(),
            file: path.display().to_string(),
            themes: BTreeMap::new(),
        },
        &themes,
    );
    index.save(&index_path)?;

    Ok(path)
}

/// CLI entry point for `memex synthesize`.
pub fn run_synthesize(
    config: &Config,
    date: Option<String>,
    categories: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", d))?,
        None => Utc::now().date_naive(),
    };

    let categories: Vec<Category> = if categories.is_empty() {
        Category::LEARNINGS.to_vec()
    } else {
        categories
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<_>>>()?
    };

    let synthesis = synthesize_week(config, &categories, date)?;

    if dry_run {
        print!("{}", synthesis.report);
        return Ok(());
    }

    let path = write_synthesis(config, &synthesis)?;

    println!("synthesize {} to {}", synthesis.start, synthesis.end);
    println!("  learnings: {}", synthesis.memory_count);
    println!("  patterns: {}", synthesis.patterns.len());
    for (theme, count, _) in &synthesis.patterns {
        println!("    {} ({})", theme, count);
    }
    println!("  low-rated: {}", synthesis.low_rated);
    println!("  report: {}", path.display());
    println!("ok");

    Ok(())
}
