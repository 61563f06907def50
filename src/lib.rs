//! Lorekeeper - trivia fact engine with RAG retrieval
//!
//! Serves rotating trivia facts with near-duplicate detection and
//! category balancing, plus a per-user knowledge retrieval path for
//! prompt augmentation.

pub mod embedding;
pub mod error;
pub mod facts;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use error::{LoreError, Result};
pub use storage::ChunkStorage;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
