//! Pattern detection: keyword grouping and insight selection.
//!
//! Memories are inverted into keyword → memories, filtered to keywords backed
//! by at least `min_group_size` distinct memories, and ordered by support.
//! Each surviving group gets exactly one insight from a fixed rule chain.

use std::collections::{HashMap, HashSet};

use crate::models::Memory;

pub const BUG_INSIGHT: &str =
    "Pattern of similar bugs - consider preventive measures or improved testing";
pub const TECH_DEBT_INSIGHT: &str =
    "Recurring refactoring work - consider addressing technical debt systematically";

/// A memory paired with the keywords extracted from it.
#[derive(Debug, Clone)]
pub struct KeyedMemory {
    pub memory: Memory,
    pub keywords: Vec<String>,
}

/// A theme backed by enough distinct memories to count as a pattern.
///
/// Lives only for the duration of one synthesis run.
#[derive(Debug, Clone)]
pub struct KeywordGroup<'a> {
    pub theme: String,
    /// Distinct memories, in encounter order.
    pub members: Vec<&'a Memory>,
    /// Raw occurrences before de-duplication by identity.
    pub raw_count: usize,
    pub insight: String,
}

impl KeywordGroup<'_> {
    /// Number of distinct memories supporting this theme.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Mean rating over rated members, if any are rated.
    pub fn average_rating(&self) -> Option<f64> {
        average_rating(&self.members)
    }
}

/// Group memories by keyword and keep the themes with enough support.
///
/// Groups are sorted by distinct member count, descending. Ties keep the
/// order in which the keyword was first encountered.
pub fn group_patterns(memories: &[KeyedMemory], min_group_size: usize) -> Vec<KeywordGroup<'_>> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&Memory>> = HashMap::new();

    for keyed in memories {
        for kw in &keyed.keywords {
            if !buckets.contains_key(kw.as_str()) {
                order.push(kw.clone());
            }
            buckets.entry(kw.as_str()).or_default().push(&keyed.memory);
        }
    }

    let mut groups: Vec<KeywordGroup<'_>> = Vec::new();
    for theme in order {
        let Some(raw) = buckets.remove(theme.as_str()) else {
            continue;
        };
        let raw_count = raw.len();

        let mut seen: HashSet<&str> = HashSet::new();
        let members: Vec<&Memory> = raw
            .into_iter()
            .filter(|m| seen.insert(m.id.as_str()))
            .collect();

        if members.len() < min_group_size {
            continue;
        }

        let insight = generate_insight(&theme, &members);
        groups.push(KeywordGroup {
            theme,
            members,
            raw_count,
            insight,
        });
    }

    // `sort_by` is stable, so equal counts keep encounter order.
    groups.sort_by(|a, b| b.count().cmp(&a.count()));
    groups
}

fn average_rating(members: &[&Memory]) -> Option<f64> {
    let ratings: Vec<f64> = members
        .iter()
        .filter_map(|m| m.rating)
        .map(f64::from)
        .collect();
    if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}

/// Pick the insight for a theme. First matching rule wins:
/// low average rating, bug-like theme, refactor-like theme, generic count.
pub fn generate_insight(theme: &str, members: &[&Memory]) -> String {
    if let Some(avg) = average_rating(members) {
        if avg < 5.0 {
            return format!(
                "Repeated low ratings (avg {:.1}/10) suggest this area needs improvement",
                avg
            );
        }
    }

    let t = theme.to_lowercase();
    if t.contains("bug") || t.contains("fix") || t.contains("error") {
        return BUG_INSIGHT.to_string();
    }
    if t.contains("refactor") || t.contains("optimize") {
        return TECH_DEBT_INSIGHT.to_string();
    }

    format!("{} instances this week", members.len())
}
