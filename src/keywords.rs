//! Topic keyword extraction for synthesis.
//!
//! A memory's keywords are its hashtags plus every vocabulary term that
//! occurs anywhere in the lower-cased body. Matching is plain substring
//! containment; there is no tokenizer, stemmer, or stop-word list.

use crate::extract::extract_tags;

/// Built-in technical vocabulary, in the order terms are reported.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "bug",
    "fix",
    "error",
    "refactor",
    "optimize",
    "performance",
    "test",
    "debug",
    "deploy",
    "api",
    "database",
    "cache",
    "security",
    "async",
    "memory",
    "algorithm",
    "architecture",
    "config",
    "migration",
    "documentation",
];

/// Extract the de-duplicated keyword list for one memory body.
///
/// Hashtags come first in order of appearance, followed by vocabulary terms
/// in vocabulary order. The same content always yields the same list.
pub fn extract_keywords(content: &str, vocabulary: &[String]) -> Vec<String> {
    let mut keywords = extract_tags(content);
    let lower = content.to_lowercase();

    for term in vocabulary {
        let term_lower = term.to_lowercase();
        if lower.contains(&term_lower) && !keywords.iter().any(|k| *k == term_lower) {
            keywords.push(term_lower);
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vec<String> {
        DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hashtags_then_vocabulary() {
        let kws = extract_keywords("#borrowck fought the Database CACHE today", &vocab());
        assert_eq!(kws, vec!["borrowck", "database", "cache"]);
    }

    #[test]
    fn hashtag_and_vocab_term_collapse() {
        let kws = extract_keywords("#bug: off-by-one", &vocab());
        assert_eq!(kws, vec!["bug"]);
    }

    #[test]
    fn substring_containment_is_intentional() {
        // "rapid" contains "api", "debugging" contains "bug" and "debug".
        let kws = extract_keywords("rapid debugging", &vocab());
        assert_eq!(kws, vec!["bug", "debug", "api"]);
    }

    #[test]
    fn deterministic_for_same_content() {
        let body = "#perf refactor the async cache layer; fix error paths";
        assert_eq!(
            extract_keywords(body, &vocab()),
            extract_keywords(body, &vocab())
        );
    }

    #[test]
    fn empty_content_has_no_keywords() {
        assert!(extract_keywords("", &vocab()).is_empty());
    }
}
