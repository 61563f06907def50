//! Property-based tests for lorekeeper
//!
//! These tests verify invariants that must hold for all inputs:
//! - Levenshtein distance is a metric-like function (identity, symmetry)
//! - Duplicate detection always flags an exact copy
//! - Validation bounds are exact
//! - The balancer never loses counts
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// LEVENSHTEIN DISTANCE
// ============================================================================

mod levenshtein_props {
    use super::*;
    use lorekeeper::facts::levenshtein;

    proptest! {
        /// Invariant: distance from a string to itself is zero
        #[test]
        fn identity(s in ".{0,80}") {
            prop_assert_eq!(levenshtein(&s, &s), 0);
        }

        /// Invariant: distance is symmetric
        #[test]
        fn symmetric(a in ".{0,60}", b in ".{0,60}") {
            prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
        }

        /// Invariant: distance is bounded by the longer string's length
        #[test]
        fn bounded_by_max_len(a in ".{0,60}", b in ".{0,60}") {
            let max_len = a.chars().count().max(b.chars().count());
            prop_assert!(levenshtein(&a, &b) <= max_len);
        }

        /// Invariant: distance to the empty string equals the char count
        #[test]
        fn empty_baseline(s in ".{0,80}") {
            prop_assert_eq!(levenshtein(&s, ""), s.chars().count());
        }
    }
}

// ============================================================================
// DUPLICATE DETECTION
// ============================================================================

mod dedup_props {
    use super::*;
    use lorekeeper::facts::DeduplicationChecker;

    proptest! {
        /// Invariant: a candidate identical to an existing fact is a duplicate
        #[test]
        fn self_duplicate(s in ".{1,200}") {
            let checker = DeduplicationChecker::default();
            prop_assert!(checker.is_duplicate(&s, &[s.clone()]));
        }

        /// Invariant: an empty corpus never produces a duplicate verdict
        #[test]
        fn empty_corpus_never_duplicate(s in ".{0,200}") {
            let checker = DeduplicationChecker::default();
            prop_assert!(!checker.is_duplicate(&s, &[]));
        }
    }
}

// ============================================================================
// VALIDATION BOUNDS
// ============================================================================

mod validation_props {
    use super::*;
    use lorekeeper::types::{validate_fact_text, MAX_FACT_CHARS, MIN_FACT_CHARS};

    proptest! {
        /// Invariant: acceptance depends only on char count
        #[test]
        fn bounds_are_exact(len in 0usize..600) {
            let text = "a".repeat(len);
            let accepted = validate_fact_text(&text).is_ok();
            prop_assert_eq!(accepted, (MIN_FACT_CHARS..=MAX_FACT_CHARS).contains(&len));
        }

        /// Invariant: multibyte chars count as one character each
        #[test]
        fn counts_chars_not_bytes(len in 0usize..600) {
            let text = "ß".repeat(len);
            let accepted = validate_fact_text(&text).is_ok();
            prop_assert_eq!(accepted, (MIN_FACT_CHARS..=MAX_FACT_CHARS).contains(&len));
        }
    }
}

// ============================================================================
// CATEGORY BALANCER
// ============================================================================

mod balancer_props {
    use super::*;
    use lorekeeper::facts::CategoryBalancer;
    use lorekeeper::types::FactCategory;

    proptest! {
        /// Invariant: total always equals the number of tracked facts
        #[test]
        fn total_conserved(picks in proptest::collection::vec(0usize..10, 0..200)) {
            let balancer = CategoryBalancer::new();
            for p in &picks {
                balancer.track_fact(FactCategory::ALL[*p]);
            }
            prop_assert_eq!(balancer.total(), picks.len() as u64);
        }

        /// Invariant: least_shown_category returns a true minimum
        #[test]
        fn least_shown_is_minimal(picks in proptest::collection::vec(0usize..10, 0..200)) {
            let balancer = CategoryBalancer::new();
            for p in &picks {
                balancer.track_fact(FactCategory::ALL[*p]);
            }
            let least = balancer.least_shown_category();
            let min = FactCategory::ALL.iter().map(|c| balancer.count(*c)).min().unwrap();
            prop_assert_eq!(balancer.count(least), min);
        }
    }
}
