//! Fact engine: store, deduplication, balancing, rotation
//!
//! The flow per request: pick a target category via the balancer,
//! optionally top the corpus up with a freshly generated fact, select
//! an unseen fact for the session, record it, and return it with
//! selection metadata.

pub mod balance;
pub mod dedup;
pub mod generate;
pub mod rotation;

pub use balance::CategoryBalancer;
pub use dedup::{levenshtein, DeduplicationChecker};
pub use generate::FactGenerator;
pub use rotation::{select_next, MemorySessionStore, SessionHistory, SessionStore};

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{validate_fact_text, Fact, FactCategory, FactRejection};

/// Soft cap on cached generated facts; curated facts never count
/// against it and are never evicted
const DEFAULT_GENERATED_CAP: usize = 120;

/// Generation attempts per request before giving up
const MAX_GENERATION_ATTEMPTS: usize = 3;

/// Ceiling on a single generation call; a stalled upstream must never
/// hold up fact selection
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 10;

/// Fact corpus: a fixed curated set plus a bounded generated cache
///
/// Generated facts are evicted FIFO once the cap is reached. Nothing
/// here survives a restart, by design.
pub struct FactStore {
    curated: Vec<Fact>,
    generated: RwLock<VecDeque<Fact>>,
    generated_cap: usize,
}

impl FactStore {
    /// Store over the built-in curated set
    pub fn new() -> Self {
        Self::with_curated(builtin_facts())
    }

    pub fn with_curated(curated: Vec<Fact>) -> Self {
        Self {
            curated,
            generated: RwLock::new(VecDeque::new()),
            generated_cap: DEFAULT_GENERATED_CAP,
        }
    }

    /// Snapshot of the full corpus (curated + generated)
    pub fn corpus(&self) -> Vec<Fact> {
        let generated = self.generated.read();
        let mut all = Vec::with_capacity(self.curated.len() + generated.len());
        all.extend(self.curated.iter().cloned());
        all.extend(generated.iter().cloned());
        all
    }

    pub fn len(&self) -> usize {
        self.curated.len() + self.generated.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate, duplicate-check, and cache a generated fact
    pub fn add_generated(
        &self,
        text: String,
        category: FactCategory,
        checker: &DeduplicationChecker,
    ) -> Result<(), FactRejection> {
        validate_fact_text(&text)?;

        let existing: Vec<String> = self.corpus().into_iter().map(|f| f.text).collect();
        if checker.is_duplicate(&text, &existing) {
            return Err(FactRejection::Duplicate);
        }

        let mut generated = self.generated.write();
        generated.push_back(Fact::generated(text, category));
        while generated.len() > self.generated_cap {
            generated.pop_front();
        }
        Ok(())
    }
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata returned alongside a selected fact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactMetadata {
    pub category: String,
    pub times_shown: u64,
    pub cache_size: usize,
    pub session_progress: String,
    pub category_distribution: HashMap<String, f64>,
}

/// Fact endpoint response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactResponse {
    pub fact: String,
    pub metadata: FactMetadata,
}

/// Orchestrates store, balancer, dedup, generation, and rotation
pub struct FactEngine {
    store: FactStore,
    balancer: CategoryBalancer,
    checker: DeduplicationChecker,
    generator: Option<Arc<dyn FactGenerator>>,
    generation_timeout: Duration,
}

impl FactEngine {
    pub fn new(store: FactStore) -> Self {
        Self {
            store,
            balancer: CategoryBalancer::new(),
            checker: DeduplicationChecker::default(),
            generator: None,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn FactGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn balancer(&self) -> &CategoryBalancer {
        &self.balancer
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Distribution keyed by category name, for stats and metadata
    pub fn distribution_by_name(&self) -> HashMap<String, f64> {
        self.balancer
            .distribution()
            .into_iter()
            .map(|(cat, share)| (cat.to_string(), share))
            .collect()
    }

    /// Serve the next fact for a session
    ///
    /// Returns `None` only when the corpus is empty, which cannot
    /// happen with the built-in curated set.
    pub async fn next_fact(&self, session: &mut SessionHistory) -> Option<FactResponse> {
        // Top the corpus up once the session has seen over half of it,
        // so long-running sessions keep getting fresh material.
        if self.store.len() > 0 && session.shown.len() * 2 >= self.store.len() {
            self.try_generate().await;
        }

        let corpus = self.store.corpus();
        let fact = select_next(session, &corpus, &self.balancer)?;

        let metadata = FactMetadata {
            category: fact.category.to_string(),
            times_shown: self.balancer.count(fact.category),
            cache_size: corpus.len(),
            session_progress: format!("{}/{}", session.shown.len(), corpus.len()),
            category_distribution: self.distribution_by_name(),
        };

        Some(FactResponse {
            fact: fact.text,
            metadata,
        })
    }

    /// Best-effort generation of one new fact for the least-shown
    /// category. Each call runs under the generation timeout; invalid
    /// or duplicate candidates get a bounded number of retries, and
    /// any failure leaves the corpus as it was.
    async fn try_generate(&self) {
        let Some(generator) = &self.generator else {
            return;
        };
        let category = self.balancer.least_shown_category();

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let outcome =
                tokio::time::timeout(self.generation_timeout, generator.generate(category)).await;
            match outcome {
                Ok(Ok(text)) => match self.store.add_generated(text, category, &self.checker) {
                    Ok(()) => {
                        tracing::debug!(%category, "cached generated fact");
                        return;
                    }
                    Err(rejection) => {
                        tracing::debug!(%category, attempt, %rejection, "generated fact rejected");
                    }
                },
                Ok(Err(e)) => {
                    tracing::warn!(%category, attempt, error = %e, "fact generation failed");
                    return;
                }
                Err(_) => {
                    tracing::warn!(
                        %category,
                        timeout_secs = self.generation_timeout.as_secs(),
                        "fact generation timed out"
                    );
                    return;
                }
            }
        }
    }
}

/// Built-in curated facts, fixed at process start
pub fn builtin_facts() -> Vec<Fact> {
    use crate::types::Difficulty::*;
    use FactCategory::*;

    vec![
        Fact::curated(
            "The original 1974 boxed set consisted of three digest-sized booklets and assumed players already owned a copy of Chainmail.",
            Editions, "od&d", Medium,
        ),
        Fact::curated(
            "THAC0, short for To Hit Armor Class 0, was the second edition's way of resolving attacks before ascending armor class arrived in third edition.",
            Mechanics, "2e", Surface,
        ),
        Fact::curated(
            "The Forgotten Realms began as Ed Greenwood's childhood story setting years before it was ever published as a campaign world.",
            Lore, "all", Surface,
        ),
        Fact::curated(
            "The beholder is a wholly original creation of the game, which is why it appears in video games only under license.",
            Monsters, "all", Medium,
        ),
        Fact::curated(
            "Elminster of Shadowdale was deliberately written as a chosen of Mystra so that Ed Greenwood could narrate Realms history through him.",
            Npcs, "all", Medium,
        ),
        Fact::curated(
            "The Deck of Many Things predates most artifacts in print and can still end a campaign with a single unlucky draw.",
            Artifacts, "all", Surface,
        ),
        Fact::curated(
            "The Great Wheel cosmology arranges sixteen Outer Planes in a ring by alignment, with the Outlands sitting neutral at the hub.",
            Planes, "all", Deep,
        ),
        Fact::curated(
            "The Tomb of Horrors was written by Gary Gygax specifically to humble players who bragged that no dungeon could kill their characters.",
            Adventures, "1e", Surface,
        ),
        Fact::curated(
            "Vecna began as a lich whose severed Hand and Eye were artifacts; only later editions promoted him to full godhood.",
            Deities, "all", Medium,
        ),
        Fact::curated(
            "A d20 has faces that sum to 210, so opposite faces of a well-made die always add up to 21.",
            Misc, "all", Surface,
        ),
        Fact::curated(
            "Dark Sun's Athas broke every setting convention of its era: no gods, scarce metal, and psionics in place of ubiquitous magic.",
            Lore, "2e", Deep,
        ),
        Fact::curated(
            "The tarrasque in fifth edition has 676 hit points, the highest of any monster in the core books.",
            Monsters, "5e", Surface,
        ),
    ]
}
