//! Near-duplicate detection for candidate facts
//!
//! Two heuristics, either of which marks a candidate as a duplicate:
//! normalized Levenshtein similarity against any existing fact, or
//! keyword-set overlap after stop-word removal.

use std::collections::HashSet;

use crate::types::DedupConfig;

/// Common words excluded from keyword comparison
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "for", "from", "had", "has",
    "have", "in", "into", "is", "it", "its", "of", "on", "or", "than", "that", "the", "their",
    "them", "there", "these", "they", "this", "to", "was", "were", "which", "who", "will", "with",
];

/// Duplicate checker over a provided fact corpus
///
/// Pure: holds thresholds only, never mutates the corpus.
pub struct DeduplicationChecker {
    config: DedupConfig,
}

impl Default for DeduplicationChecker {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}

impl DeduplicationChecker {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Check whether `candidate` is too close to anything in `existing`.
    ///
    /// The check is asymmetric by design: overlap is measured against the
    /// candidate's keyword set, and a candidate identical to an existing
    /// fact is always a duplicate.
    pub fn is_duplicate(&self, candidate: &str, existing: &[String]) -> bool {
        let candidate_keywords = extract_keywords(candidate);

        for fact in existing {
            if self.edit_similarity(candidate, fact) >= self.config.similarity_threshold {
                return true;
            }

            // Keyword check only applies when the candidate has keywords
            if !candidate_keywords.is_empty() {
                let fact_keywords = extract_keywords(fact);
                let overlap = candidate_keywords.intersection(&fact_keywords).count();
                let ratio = overlap as f64 / candidate_keywords.len() as f64;
                if ratio >= self.config.keyword_overlap_threshold {
                    return true;
                }
            }
        }

        false
    }

    /// Normalized similarity: (max_len - distance) / max_len
    fn edit_similarity(&self, a: &str, b: &str) -> f64 {
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        let max_len = a_len.max(b_len);
        if max_len == 0 {
            return 1.0;
        }
        let dist = levenshtein(a, b);
        (max_len - dist) as f64 / max_len as f64
    }
}

/// Calculate Levenshtein distance between two strings
///
/// Unit costs for insertion, deletion, substitution. Two-row DP,
/// O(min) extra space relative to the full matrix.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr_row[0] = i;

        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };

            curr_row[j] = (prev_row[j] + 1) // deletion
                .min(curr_row[j - 1] + 1) // insertion
                .min(prev_row[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

/// Extract lowercase alphanumeric tokens minus stop words
pub fn extract_keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && !STOP_WORDS.contains(s))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_levenshtein_symmetric() {
        assert_eq!(
            levenshtein("tarrasque", "terrasque"),
            levenshtein("terrasque", "tarrasque")
        );
        assert_eq!(levenshtein("abc", "xyz"), levenshtein("xyz", "abc"));
    }

    #[test]
    fn test_self_duplicate() {
        let checker = DeduplicationChecker::default();
        let text = "The Deck of Many Things can rewrite an entire campaign in one draw.";
        assert!(checker.is_duplicate(text, &[text.to_string()]));
    }

    #[test]
    fn test_near_duplicate_by_edit_distance() {
        let checker = DeduplicationChecker::default();
        let existing = vec!["Gary Gygax co-created the original game in 1974 in Lake Geneva.".to_string()];
        // One word changed: similarity well above 0.80
        assert!(checker.is_duplicate(
            "Gary Gygax co-created the original game in 1974 at Lake Geneva.",
            &existing
        ));
    }

    #[test]
    fn test_duplicate_by_keyword_overlap() {
        let checker = DeduplicationChecker::default();
        let existing =
            vec!["The Tarrasque is a giant creature that levels entire cities.".to_string()];
        // Shares tarrasque/levels/entire/cities: 4 of 5 candidate keywords
        assert!(checker.is_duplicate("The Tarrasque levels entire cities easily.", &existing));
    }

    #[test]
    fn test_distinct_facts_pass() {
        let checker = DeduplicationChecker::default();
        let existing = vec![
            "Beholders are paranoid tyrants that dream new realities into being.".to_string(),
            "The Forgotten Realms setting was created by Ed Greenwood.".to_string(),
        ];
        assert!(!checker.is_duplicate(
            "Mind flayers communicate telepathically and feed on humanoid brains.",
            &existing
        ));
    }

    #[test]
    fn test_empty_keyword_set_falls_back_to_edit_distance() {
        let checker = DeduplicationChecker::default();
        // All stop words: keyword check disabled, edit distance decides
        assert!(!checker.is_duplicate("the and of", &["a very different string".to_string()]));
    }

    #[test]
    fn test_empty_corpus() {
        let checker = DeduplicationChecker::default();
        assert!(!checker.is_duplicate("Anything at all counts as fresh here.", &[]));
    }

    #[test]
    fn test_extract_keywords() {
        let kw = extract_keywords("The Tarrasque is a 50-foot monster that destroys cities.");
        assert!(kw.contains("tarrasque"));
        assert!(kw.contains("cities"));
        assert!(!kw.contains("the"));
        assert!(!kw.contains("that"));
    }
}
