//! Weekly synthesis report rendering.
//!
//! The markdown layout (headings, ordering, bullet shapes) is stable so that
//! reports from different weeks can be diffed against each other.

use chrono::NaiveDate;

use crate::config::SynthesisConfig;
use crate::models::Memory;
use crate::patterns::KeywordGroup;

/// Everything needed to render one week's report.
pub struct WeeklyReport<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub memories: &'a [Memory],
    pub groups: &'a [KeywordGroup<'a>],
}

impl WeeklyReport<'_> {
    /// Memories rated at or below the threshold, in load order.
    pub fn low_rated(&self, threshold: u8) -> Vec<&Memory> {
        self.memories
            .iter()
            .filter(|m| m.rating.is_some_and(|r| r <= threshold))
            .collect()
    }

    pub fn render(&self, cfg: &SynthesisConfig) -> String {
        let mut out = String::new();
        let low = self.low_rated(cfg.low_rating_threshold);

        out.push_str(&format!("# Weekly Synthesis: {} to {}\n\n", self.start, self.end));
        out.push_str(&format!("**Learnings captured:** {}\n", self.memories.len()));
        out.push_str(&format!("**Patterns detected:** {}\n\n", self.groups.len()));

        out.push_str("## Recurring Patterns\n\n");
        if self.groups.is_empty() {
            out.push_str(&format!(
                "No recurring patterns this week (a theme needs at least {} learnings).\n\n",
                cfg.min_group_size
            ));
        }
        for group in self.groups.iter().take(cfg.max_groups) {
            out.push_str(&format!("### {} ({} occurrences)\n\n", group.theme, group.count()));
            out.push_str(&format!("**Insight:** {}\n\n", group.insight));
            out.push_str("**Related learnings:**\n");
            for m in group.members.iter().take(cfg.members_per_group) {
                out.push_str(&format!("- {} ({})\n", m.title, m.date));
            }
            if group.count() > cfg.members_per_group {
                out.push_str(&format!(
                    "- ...and {} more\n",
                    group.count() - cfg.members_per_group
                ));
            }
            out.push('\n');
        }

        out.push_str("## Key Insights\n\n");
        if self.groups.is_empty() {
            out.push_str("No key insights this week.\n");
        }
        for (i, group) in self.groups.iter().take(cfg.key_insights).enumerate() {
            out.push_str(&format!("{}. **{}**: {}\n", i + 1, group.theme, group.insight));
        }
        out.push('\n');

        out.push_str("## Low-Rated Learnings\n\n");
        if low.is_empty() {
            out.push_str(&format!(
                "No learnings rated {} or below.\n",
                cfg.low_rating_threshold
            ));
        }
        for m in &low {
            out.push_str(&format!(
                "- {} ({}) - rated {}/10\n",
                m.title,
                m.date,
                m.rating.unwrap_or_default()
            ));
        }
        out.push('\n');

        out.push_str("## Action Items\n\n");
        if !self.groups.is_empty() {
            out.push_str(
                "- [ ] Review the recurring patterns above and decide which deserve a preventive fix\n",
            );
        }
        if !low.is_empty() {
            out.push_str(
                "- [ ] Revisit low-rated learnings and note what would have made them useful\n",
            );
        }
        if self.groups.is_empty() && low.is_empty() {
            out.push_str("- [ ] Keep capturing learnings; nothing needs follow-up this week\n");
        }
        out.push_str("- [ ] Carry this week's key insights into next week's plan\n");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::tests::memory;
    use crate::patterns::{group_patterns, KeyedMemory};

    fn week() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        )
    }

    #[test]
    fn empty_week_renders_fallback_sections() {
        let (start, end) = week();
        let report = WeeklyReport {
            start,
            end,
            memories: &[],
            groups: &[],
        };
        let text = report.render(&SynthesisConfig::default());
        assert!(text.starts_with("# Weekly Synthesis: 2026-10-12 to 2026-10-18\n"));
        assert!(text.contains("**Patterns detected:** 0"));
        assert!(text.contains("No recurring patterns this week"));
        assert!(text.contains("No learnings rated 3 or below."));
        assert!(text.contains("nothing needs follow-up this week"));
    }

    #[test]
    fn low_rated_items_need_not_form_a_group() {
        let (start, end) = week();
        let memories = vec![memory("a", Some(2)), memory("b", Some(3)), memory("c", Some(4))];
        let report = WeeklyReport {
            start,
            end,
            memories: &memories,
            groups: &[],
        };
        let text = report.render(&SynthesisConfig::default());
        assert!(text.contains("- Title a (2026-10-14) - rated 2/10"));
        assert!(text.contains("- Title b (2026-10-14) - rated 3/10"));
        assert!(!text.contains("Title c (2026-10-14) - rated"));
        assert!(text.contains("Revisit low-rated learnings"));
    }

    #[test]
    fn groups_and_members_are_capped() {
        let (start, end) = week();
        let keyed: Vec<KeyedMemory> = (0..7)
            .map(|i| KeyedMemory {
                memory: memory(&format!("m{}", i), None),
                keywords: vec!["cache".to_string()],
            })
            .collect();
        let groups = group_patterns(&keyed, 3);
        let memories: Vec<Memory> = keyed.iter().map(|k| k.memory.clone()).collect();
        let report = WeeklyReport {
            start,
            end,
            memories: &memories,
            groups: &groups,
        };
        let text = report.render(&SynthesisConfig::default());
        assert!(text.contains("### cache (7 occurrences)"));
        assert!(text.contains("**Insight:** 7 instances this week"));
        assert!(text.contains("- Title m4 (2026-10-14)"));
        assert!(!text.contains("- Title m5 (2026-10-14)"));
        assert!(text.contains("- ...and 2 more"));
        assert!(text.contains("1. **cache**: 7 instances this week"));
    }

    #[test]
    fn section_layout_is_stable() {
        let (start, end) = week();
        let keyed: Vec<KeyedMemory> = (0..3)
            .map(|i| KeyedMemory {
                memory: memory(&format!("m{}", i), None),
                keywords: vec!["cache".to_string()],
            })
            .collect();
        let groups = group_patterns(&keyed, 3);
        let memories: Vec<Memory> = keyed.iter().map(|k| k.memory.clone()).collect();
        let report = WeeklyReport {
            start,
            end,
            memories: &memories,
            groups: &groups,
        };
        let text = report.render(&SynthesisConfig::default());
        assert!(text.starts_with(
            "# Weekly Synthesis: 2026-10-12 to 2026-10-18\n\n**Learnings captured:** 3\n**Patterns detected:** 1\n\n## Recurring Patterns\n\n"
        ));
        assert!(text.contains(
            "### cache (3 occurrences)\n\n**Insight:** 3 instances this week\n\n**Related learnings:**\n- Title m0 (2026-10-14)\n- Title m1 (2026-10-14)\n- Title m2 (2026-10-14)\n\n## Key Insights\n\n1. **cache**: 3 instances this week\n\n## Low-Rated Learnings\n"
        ));
        assert!(text.ends_with("- [ ] Carry this week's key insights into next week's plan\n"));
    }
}
