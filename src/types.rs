//! Core types for Lorekeeper

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fact category classification
///
/// A closed enum rather than free-form strings so the balancer and
/// selection logic get exhaustiveness checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FactCategory {
    Editions,
    Mechanics,
    Lore,
    Monsters,
    Npcs,
    Artifacts,
    Planes,
    Adventures,
    Deities,
    #[default]
    Misc,
}

impl FactCategory {
    /// All categories in stable declaration order.
    ///
    /// This order is the deterministic tie-break for least-shown
    /// category selection.
    pub const ALL: [FactCategory; 10] = [
        FactCategory::Editions,
        FactCategory::Mechanics,
        FactCategory::Lore,
        FactCategory::Monsters,
        FactCategory::Npcs,
        FactCategory::Artifacts,
        FactCategory::Planes,
        FactCategory::Adventures,
        FactCategory::Deities,
        FactCategory::Misc,
    ];

    /// Index into [`FactCategory::ALL`], used by the balancer's counter array.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(9)
    }
}

impl std::fmt::Display for FactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FactCategory::Editions => "editions",
            FactCategory::Mechanics => "mechanics",
            FactCategory::Lore => "lore",
            FactCategory::Monsters => "monsters",
            FactCategory::Npcs => "npcs",
            FactCategory::Artifacts => "artifacts",
            FactCategory::Planes => "planes",
            FactCategory::Adventures => "adventures",
            FactCategory::Deities => "deities",
            FactCategory::Misc => "misc",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FactCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "editions" => Ok(FactCategory::Editions),
            "mechanics" => Ok(FactCategory::Mechanics),
            "lore" => Ok(FactCategory::Lore),
            "monsters" => Ok(FactCategory::Monsters),
            "npcs" => Ok(FactCategory::Npcs),
            "artifacts" => Ok(FactCategory::Artifacts),
            "planes" => Ok(FactCategory::Planes),
            "adventures" => Ok(FactCategory::Adventures),
            "deities" => Ok(FactCategory::Deities),
            "misc" => Ok(FactCategory::Misc),
            _ => Err(format!("Unknown fact category: {}", s)),
        }
    }
}

/// How deep into the rules/lore a fact goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Surface,
    Medium,
    Deep,
}

/// A single trivia fact. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// The fact text (50-500 chars, enforced at creation)
    pub text: String,
    /// Topic category
    pub category: FactCategory,
    /// Game edition the fact applies to ("1e".."5e", "all", ...)
    #[serde(default = "default_edition")]
    pub edition: String,
    /// How obscure the fact is
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Curated facts are permanent; generated facts may be evicted
    #[serde(default)]
    pub curated: bool,
}

impl Fact {
    pub fn curated(text: &str, category: FactCategory, edition: &str, difficulty: Difficulty) -> Self {
        Self {
            text: text.to_string(),
            category,
            edition: edition.to_string(),
            difficulty,
            curated: true,
        }
    }

    pub fn generated(text: String, category: FactCategory) -> Self {
        Self {
            text,
            category,
            edition: default_edition(),
            difficulty: Difficulty::Medium,
            curated: false,
        }
    }
}

fn default_edition() -> String {
    "all".to_string()
}

/// Minimum fact length in characters
pub const MIN_FACT_CHARS: usize = 50;

/// Maximum fact length in characters
pub const MAX_FACT_CHARS: usize = 500;

/// Why a candidate fact was rejected before entering the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FactRejection {
    #[error("fact text shorter than {MIN_FACT_CHARS} characters")]
    TooShort,
    #[error("fact text longer than {MAX_FACT_CHARS} characters")]
    TooLong,
    #[error("fact text too similar to an existing fact")]
    Duplicate,
}

/// Validate candidate fact text length (character count, not bytes)
///
/// Exactly 50 and exactly 500 characters are accepted.
pub fn validate_fact_text(text: &str) -> Result<(), FactRejection> {
    let chars = text.chars().count();
    if chars < MIN_FACT_CHARS {
        return Err(FactRejection::TooShort);
    }
    if chars > MAX_FACT_CHARS {
        return Err(FactRejection::TooLong);
    }
    Ok(())
}

/// Where a knowledge chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkSource {
    Conversation,
    File,
    Email,
    Drive,
    #[default]
    Manual,
}

impl std::fmt::Display for ChunkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChunkSource::Conversation => "conversation",
            ChunkSource::File => "file",
            ChunkSource::Email => "email",
            ChunkSource::Drive => "drive",
            ChunkSource::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ChunkSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conversation" => Ok(ChunkSource::Conversation),
            "file" => Ok(ChunkSource::File),
            "email" => Ok(ChunkSource::Email),
            "drive" => Ok(ChunkSource::Drive),
            "manual" => Ok(ChunkSource::Manual),
            _ => Err(format!("Unknown chunk source: {}", s)),
        }
    }
}

/// A unit of stored user knowledge plus its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique identifier
    pub id: String,
    /// Owning user; retrieval is always scoped to one user
    pub user_id: String,
    /// Ingestion source
    pub source: ChunkSource,
    /// Chunk text
    pub content: String,
    /// Embedding vector (skipped in API responses)
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
    /// Importance score (0.0 - 1.0)
    pub importance: f32,
    /// When the chunk was ingested
    pub created_at: DateTime<Utc>,
    /// Logical-delete flag; inactive chunks are never retrieved
    pub is_active: bool,
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(flatten)]
    pub chunk: KnowledgeChunk,
    /// Cosine similarity to the query embedding
    pub similarity: f32,
}

/// Embedding backend configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Backend name ("openai" or "tfidf")
    pub model: String,
    /// API key for the openai backend
    pub api_key: Option<String>,
    /// Override API base URL (OpenAI-compatible providers)
    pub base_url: Option<String>,
    /// Embedding dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "tfidf".to_string(),
            api_key: None,
            base_url: None,
            dimensions: 1536,
        }
    }
}

/// Duplicate-detection thresholds
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Normalized edit-distance similarity at or above which a
    /// candidate is a duplicate
    pub similarity_threshold: f64,
    /// Keyword overlap ratio at or above which a candidate is a
    /// duplicate regardless of edit distance
    pub keyword_overlap_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.80,
            keyword_overlap_threshold: 0.70,
        }
    }
}

/// Retrieval path configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Default number of chunks to return
    pub top_k: usize,
    /// Cap on client-requested top_k
    pub max_top_k: usize,
    /// Timeout for the embedding call, in seconds
    pub embed_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_top_k: 50,
            embed_timeout_secs: 8,
        }
    }
}

/// Chunk store configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// SQLite database path (":memory:" for tests)
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
        }
    }
}
