//! Per-session fact rotation
//!
//! A session never sees the same fact twice until the whole corpus has
//! been shown, after which the shown set clears and rotation restarts.
//! Sessions expire 24 hours after creation; expiry is checked on read,
//! never by a background job.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::balance::CategoryBalancer;
use crate::types::Fact;

/// Session lifetime
const SESSION_TTL_HOURS: i64 = 24;

/// Which facts a client has already seen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Texts of facts already shown this rotation
    pub shown: HashSet<String>,
    /// When the session was created
    pub started_at: DateTime<Utc>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self {
            shown: HashSet::new(),
            started_at: Utc::now(),
        }
    }

    /// Sessions older than 24 hours behave as brand-new
    pub fn is_expired(&self) -> bool {
        Utc::now() - self.started_at > Duration::hours(SESSION_TTL_HOURS)
    }

    /// Clear shown facts and restart the clock
    pub fn reset(&mut self) {
        self.shown.clear();
        self.started_at = Utc::now();
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Session persistence seam
///
/// The production store is in-memory and keyed by a server-issued id;
/// tests construct histories directly.
pub trait SessionStore: Send + Sync {
    /// Resolve a session id, treating expired or unknown ids as new sessions
    fn get(&self, session_id: &str) -> SessionHistory;

    /// Persist a session after selection
    fn put(&self, session_id: &str, history: SessionHistory);
}

/// DashMap-backed session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionHistory>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> SessionHistory {
        match self.sessions.get(session_id) {
            Some(history) if !history.is_expired() => history.clone(),
            _ => SessionHistory::new(),
        }
    }

    fn put(&self, session_id: &str, history: SessionHistory) {
        self.sessions.insert(session_id.to_string(), history);
    }
}

/// Select the next fact for a session
///
/// Unseen facts are preferred; among them, facts in the balancer's
/// least-shown category win, randomizing among ties. When the session
/// has exhausted the corpus, the shown set clears and rotation
/// restarts with the full corpus as candidates.
///
/// Returns `None` only for an empty corpus.
pub fn select_next(
    session: &mut SessionHistory,
    corpus: &[Fact],
    balancer: &CategoryBalancer,
) -> Option<Fact> {
    if corpus.is_empty() {
        return None;
    }

    if session.is_expired() {
        session.reset();
    }

    let mut candidates: Vec<&Fact> = corpus
        .iter()
        .filter(|f| !session.shown.contains(&f.text))
        .collect();

    // Exhausted: reset and rotate again over the full corpus
    if candidates.is_empty() {
        session.reset();
        candidates = corpus.iter().collect();
    }

    let target = balancer.least_shown_category();
    let in_target: Vec<&Fact> = candidates
        .iter()
        .filter(|f| f.category == target)
        .copied()
        .collect();

    let mut rng = rand::thread_rng();
    let selected: &Fact = match in_target.choose(&mut rng) {
        Some(fact) => *fact,
        // No unseen fact in the target category: any candidate will do
        None => candidates.choose(&mut rng).copied()?,
    };

    session.shown.insert(selected.text.clone());
    balancer.track_fact(selected.category);

    Some(selected.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, FactCategory};

    fn lore_fact(text: &str) -> Fact {
        Fact::curated(text, FactCategory::Lore, "all", Difficulty::Surface)
    }

    fn three_fact_corpus() -> Vec<Fact> {
        vec![
            lore_fact("Fact A: the Realms were first mapped on graph paper at a kitchen table."),
            lore_fact("Fact B: the Underdark spans thousands of miles beneath the surface world."),
            lore_fact("Fact C: Waterdeep is known as the City of Splendors for good reason."),
        ]
    }

    #[test]
    fn test_no_repeats_within_rotation() {
        let corpus = three_fact_corpus();
        let balancer = CategoryBalancer::new();
        let mut session = SessionHistory::new();

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let fact = select_next(&mut session, &corpus, &balancer).unwrap();
            assert!(seen.insert(fact.text), "repeated a fact within one rotation");
        }
        assert_eq!(session.shown.len(), 3);
    }

    #[test]
    fn test_exhaustion_resets_rotation() {
        let corpus = three_fact_corpus();
        let balancer = CategoryBalancer::new();
        let mut session = SessionHistory::new();

        for _ in 0..3 {
            select_next(&mut session, &corpus, &balancer).unwrap();
        }

        // Fourth call: corpus exhausted, rotation restarts
        let fourth = select_next(&mut session, &corpus, &balancer).unwrap();
        assert!(corpus.iter().any(|f| f.text == fourth.text));
        assert_eq!(session.shown.len(), 1);
    }

    #[test]
    fn test_empty_corpus_returns_none() {
        let balancer = CategoryBalancer::new();
        let mut session = SessionHistory::new();
        assert!(select_next(&mut session, &[], &balancer).is_none());
    }

    #[test]
    fn test_expired_session_starts_fresh() {
        let corpus = three_fact_corpus();
        let balancer = CategoryBalancer::new();

        let mut session = SessionHistory::new();
        session.shown.insert(corpus[0].text.clone());
        session.shown.insert(corpus[1].text.clone());
        session.started_at = Utc::now() - Duration::hours(25);

        let fact = select_next(&mut session, &corpus, &balancer).unwrap();
        // Reset happened: only the newly shown fact is recorded
        assert_eq!(session.shown.len(), 1);
        assert!(session.shown.contains(&fact.text));
    }

    #[test]
    fn test_prefers_least_shown_category() {
        let corpus = vec![
            lore_fact("Lore fact one about the long history of the Forgotten Realms setting."),
            Fact::curated(
                "Monster fact: the beholder was one of the first original monsters designed.",
                FactCategory::Monsters,
                "all",
                Difficulty::Surface,
            ),
        ];
        let balancer = CategoryBalancer::new();
        // Push lore well above monsters; least-shown among present categories
        // eventually steers selection toward monsters once lore is ahead.
        for _ in 0..5 {
            balancer.track_fact(FactCategory::Lore);
        }

        // Editions is globally least-shown but has no facts here, so
        // selection falls through to any candidate without panicking.
        let mut session = SessionHistory::new();
        let fact = select_next(&mut session, &corpus, &balancer).unwrap();
        assert!(corpus.iter().any(|f| f.text == fact.text));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let mut history = SessionHistory::new();
        history.shown.insert("some fact".to_string());

        store.put("abc", history);
        assert_eq!(store.get("abc").shown.len(), 1);

        // Unknown id resolves to a fresh session
        assert!(store.get("missing").shown.is_empty());
    }

    #[test]
    fn test_store_drops_expired_session_on_read() {
        let store = MemorySessionStore::new();
        let mut history = SessionHistory::new();
        history.shown.insert("old fact".to_string());
        history.started_at = Utc::now() - Duration::hours(30);

        store.put("stale", history);
        assert!(store.get("stale").shown.is_empty());
    }
}
