//! Fixed-pattern metadata extraction from markdown memories.
//!
//! Everything here is a pure function over text or paths: titles, ratings,
//! hashtags, embedded dates, and the derived importance/stability scores.
//! No tokenizer is involved; patterns are compiled once and reused.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::TruncationConfig;
use crate::models::Category;

static HEADING: OnceLock<Regex> = OnceLock::new();
static RATING: OnceLock<Regex> = OnceLock::new();
static HASHTAG: OnceLock<Regex> = OnceLock::new();
static DATE_TIME: OnceLock<Regex> = OnceLock::new();
static DATE_ONLY: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING.get_or_init(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*\r?$").expect("heading regex is valid"))
}

fn rating_re() -> &'static Regex {
    RATING.get_or_init(|| {
        Regex::new(r"(?i)\b(?:rating|rate)\b[\s:*=\-]*(\d{1,2})\b").expect("rating regex is valid")
    })
}

fn hashtag_re() -> &'static Regex {
    HASHTAG.get_or_init(|| Regex::new(r"#([A-Za-z0-9_-]+)").expect("hashtag regex is valid"))
}

fn date_time_re() -> &'static Regex {
    DATE_TIME.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})[T_-](\d{2})[:-]?(\d{2})[:-]?(\d{2})")
            .expect("date-time regex is valid")
    })
}

fn date_only_re() -> &'static Regex {
    DATE_ONLY.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("date regex is valid"))
}

/// First top-level (`# `) heading in the content.
pub fn extract_title(content: &str) -> Option<String> {
    heading_re()
        .captures(content)
        .map(|c| c[1].to_string())
        .filter(|t| !t.is_empty())
}

/// Human-readable title derived from a file name.
///
/// Leading date stamps are dropped and `-`/`_` become spaces. Session
/// summaries (`summary.md`) take their name from the session directory.
pub fn slug_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let base = if stem.eq_ignore_ascii_case("summary") {
        path.parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(stem)
    } else {
        stem
    };

    let without_date = match date_time_re().find(&base) {
        Some(m) if m.start() == 0 => base[m.end()..].to_string(),
        _ => match date_only_re().find(&base) {
            Some(m) if m.start() == 0 => base[m.end()..].to_string(),
            _ => base.clone(),
        },
    };

    let words: Vec<&str> = without_date
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        base
    } else {
        words.join(" ")
    }
}

/// Rating 1-10 written next to the word "rating" or "rate".
///
/// Values outside 1-10 are ignored and the next candidate is tried.
pub fn extract_rating(content: &str) -> Option<u8> {
    rating_re()
        .captures_iter(content)
        .filter_map(|c| c[1].parse::<u8>().ok())
        .find(|r| (1..=10).contains(r))
}

/// Hashtags in order of first appearance, without the leading `#`.
///
/// Case is preserved; duplicates are dropped.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in hashtag_re().captures_iter(content) {
        let tag = &cap[1];
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Date (and time when present) embedded in a path.
///
/// A date+time stamp wins over a bare date.
pub fn date_from_path(path: &str) -> Option<NaiveDateTime> {
    for cap in date_time_re().captures_iter(path) {
        let date = ymd(&cap[1], &cap[2], &cap[3]);
        let time = NaiveTime::from_hms_opt(
            cap[4].parse().ok()?,
            cap[5].parse().ok()?,
            cap[6].parse().ok()?,
        );
        if let (Some(d), Some(t)) = (date, time) {
            return Some(d.and_time(t));
        }
    }

    date_only_re()
        .captures_iter(path)
        .find_map(|cap| ymd(&cap[1], &cap[2], &cap[3]))
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// Best-effort creation time: path date+time, path date, file mtime, now.
pub fn resolve_timestamp(
    relative_path: &str,
    modified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    date_from_path(relative_path)
        .map(|dt| dt.and_utc())
        .or(modified)
        .unwrap_or(now)
}

pub fn importance(rating: Option<u8>, category: Category) -> u8 {
    match rating {
        Some(r) if r >= 8 => 5,
        Some(r) if r >= 6 => 4,
        Some(r) if r >= 4 => 3,
        Some(_) => 2,
        None => category.default_importance(),
    }
}

pub fn stability(relative_path: &str, category: Category) -> u8 {
    let p = relative_path.to_ascii_lowercase();
    if p.contains("identity") {
        5
    } else if p.contains("learnings/algorithm") {
        4
    } else if p.contains("sessions/") {
        2
    } else {
        category.default_stability()
    }
}

/// Apply the per-category body truncation policy.
pub fn truncate_body(body: &str, category: Category, limits: &TruncationConfig) -> String {
    let max_chars = match category {
        Category::JournalEntry => limits.journal_chars,
        Category::WorkSession => limits.session_chars,
        Category::AlgorithmLearning | Category::SystemLearning => return body.to_string(),
    };
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn title_is_first_top_level_heading() {
        let md = "intro\n## Sub\n# Binary Search Pitfalls\n# Second";
        assert_eq!(
            extract_title(md).as_deref(),
            Some("Binary Search Pitfalls")
        );
        assert_eq!(extract_title("## only sub"), None);
    }

    #[test]
    fn slug_title_strips_date_prefix() {
        assert_eq!(
            slug_title(Path::new("learnings/algorithm/2026-10/2026-10-14-two-pointer_tricks.md")),
            "two pointer tricks"
        );
        assert_eq!(
            slug_title(Path::new("sessions/2026-10/2026-10-14-153000_api-cleanup/summary.md")),
            "api cleanup"
        );
    }

    #[test]
    fn rating_near_keyword() {
        assert_eq!(extract_rating("**Rating:** 7/10"), Some(7));
        assert_eq!(extract_rating("RATE: 9"), Some(9));
        assert_eq!(extract_rating("rating 42 then rating: 3"), Some(3));
        assert_eq!(extract_rating("no score here"), None);
        assert_eq!(extract_rating("generated at 5"), None);
    }

    #[test]
    fn tags_keep_case_and_order() {
        let tags = extract_tags("#bug in #Parser, again #bug and #tech_debt-2");
        assert_eq!(tags, vec!["bug", "Parser", "tech_debt-2"]);
    }

    #[test]
    fn headings_are_not_tags() {
        assert!(extract_tags("# Title\n## Section").is_empty());
    }

    #[test]
    fn date_time_beats_date_only() {
        let dt = date_from_path("sessions/2026-10/2026-10-14-153012_x/summary.md").unwrap();
        assert_eq!(dt.to_string(), "2026-10-14 15:30:12");
        let d = date_from_path("journal/2026-10/2026-10-02-morning.md").unwrap();
        assert_eq!(d.to_string(), "2026-10-02 00:00:00");
        assert!(date_from_path("journal/2026-10/notes.md").is_none());
    }

    #[test]
    fn timestamp_falls_back_to_mtime_then_now() {
        let mtime = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_timestamp("a/notes.md", Some(mtime), now), mtime);
        assert_eq!(resolve_timestamp("a/notes.md", None, now), now);
    }

    #[test]
    fn importance_scales_with_rating() {
        assert_eq!(importance(Some(9), Category::JournalEntry), 5);
        assert_eq!(importance(Some(6), Category::JournalEntry), 4);
        assert_eq!(importance(Some(4), Category::JournalEntry), 3);
        assert_eq!(importance(Some(1), Category::JournalEntry), 2);
        assert_eq!(importance(None, Category::AlgorithmLearning), 4);
    }

    #[test]
    fn stability_by_path() {
        assert_eq!(stability("journal/core-identity.md", Category::JournalEntry), 5);
        assert_eq!(
            stability("learnings/algorithm/2026-10/x.md", Category::AlgorithmLearning),
            4
        );
        assert_eq!(stability("sessions/2026-10/x/summary.md", Category::WorkSession), 2);
        assert_eq!(stability("learnings/system/2026-10/x.md", Category::SystemLearning), 3);
    }

    #[test]
    fn journal_bodies_are_truncated_hardest() {
        let limits = TruncationConfig {
            journal_chars: 4,
            session_chars: 8,
        };
        let body = "abcdefghijkl";
        assert_eq!(truncate_body(body, Category::JournalEntry, &limits), "abcd");
        assert_eq!(truncate_body(body, Category::WorkSession, &limits), "abcdefgh");
        assert_eq!(truncate_body(body, Category::SystemLearning, &limits), body);
        assert_eq!(truncate_body("éé", Category::JournalEntry, &limits), "éé");
    }
}
