//! Category balancing for fact selection
//!
//! Process-wide shown-counts per category, biasing selection toward
//! underrepresented topics. Counters are relaxed atomics: a lost
//! increment under contention is cosmetic, not a correctness issue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::FactCategory;

/// Fraction of the mean below which a category counts as underrepresented
const UNDERREPRESENTED_RATIO: f64 = 0.8;

/// Shown-count tracker across all fact categories
#[derive(Debug, Default)]
pub struct CategoryBalancer {
    counts: [AtomicU64; FactCategory::ALL.len()],
}

impl CategoryBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a fact of this category was shown
    pub fn track_fact(&self, category: FactCategory) {
        self.counts[category.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Shown-count for one category
    pub fn count(&self, category: FactCategory) -> u64 {
        self.counts[category.index()].load(Ordering::Relaxed)
    }

    /// Total facts shown across all categories
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Category with the minimum shown-count
    ///
    /// Ties break to the first category in [`FactCategory::ALL`] order,
    /// so the result is deterministic.
    pub fn least_shown_category(&self) -> FactCategory {
        let mut best = FactCategory::ALL[0];
        let mut best_count = self.count(best);

        for cat in &FactCategory::ALL[1..] {
            let count = self.count(*cat);
            if count < best_count {
                best = *cat;
                best_count = count;
            }
        }

        best
    }

    /// Whether a category's count sits significantly below the mean
    /// (below 80% of it)
    pub fn is_underrepresented(&self, category: FactCategory) -> bool {
        let total = self.total();
        if total == 0 {
            return false;
        }
        let mean = total as f64 / FactCategory::ALL.len() as f64;
        (self.count(category) as f64) < mean * UNDERREPRESENTED_RATIO
    }

    /// Each category's share of total facts shown, as a fraction in [0, 1]
    pub fn distribution(&self) -> HashMap<FactCategory, f64> {
        let total = self.total();
        FactCategory::ALL
            .iter()
            .map(|cat| {
                let share = if total == 0 {
                    0.0
                } else {
                    self.count(*cat) as f64 / total as f64
                };
                (*cat, share)
            })
            .collect()
    }
}
