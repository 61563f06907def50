//! Lorekeeper HTTP server
//!
//! Run with: lorekeeper-server

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lorekeeper::embedding::create_embedder;
use lorekeeper::error::Result;
use lorekeeper::facts::{FactEngine, FactStore, MemorySessionStore};
use lorekeeper::retrieval::KnowledgeRetriever;
use lorekeeper::server::{serve, AppState};
use lorekeeper::storage::ChunkStorage;
use lorekeeper::types::{EmbeddingConfig, RetrievalConfig, StorageConfig};

#[derive(Parser, Debug)]
#[command(name = "lorekeeper-server")]
#[command(about = "Trivia fact and knowledge retrieval server")]
struct Args {
    /// HTTP port
    #[arg(long, env = "LOREKEEPER_PORT", default_value = "8420")]
    port: u16,

    /// Chunk database path (":memory:" for ephemeral)
    #[arg(long, env = "LOREKEEPER_DB_PATH", default_value = "lorekeeper.db")]
    db_path: String,

    /// Embedding backend (openai, tfidf)
    #[arg(long, env = "LOREKEEPER_EMBEDDING_MODEL", default_value = "tfidf")]
    embedding_model: String,

    /// Embedding dimensions
    #[arg(long, env = "LOREKEEPER_EMBEDDING_DIMENSIONS", default_value = "1536")]
    embedding_dimensions: usize,

    /// OpenAI API key (enables generation and openai embeddings)
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: Option<String>,

    /// Override OpenAI-compatible API base URL
    #[arg(long, env = "LOREKEEPER_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Embedding call timeout in seconds
    #[arg(long, env = "LOREKEEPER_EMBED_TIMEOUT", default_value = "8")]
    embed_timeout_secs: u64,

    /// Default retrieval top-k
    #[arg(long, env = "LOREKEEPER_TOP_K", default_value = "10")]
    top_k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let storage = ChunkStorage::open(&StorageConfig {
        db_path: args.db_path.clone(),
    })?;

    let embedding_config = EmbeddingConfig {
        model: args.embedding_model,
        api_key: args.openai_key.clone(),
        base_url: args.api_base_url.clone(),
        dimensions: args.embedding_dimensions,
    };
    let embedder = create_embedder(&embedding_config)?;
    tracing::info!(model = embedder.model_name(), "embedder ready");

    let retrieval_config = RetrievalConfig {
        top_k: args.top_k,
        embed_timeout_secs: args.embed_timeout_secs,
        ..Default::default()
    };
    let retriever = KnowledgeRetriever::with_config(storage, embedder, retrieval_config);

    #[cfg_attr(not(feature = "openai"), allow(unused_mut))]
    let mut engine = FactEngine::new(FactStore::new());
    #[cfg(feature = "openai")]
    if let Some(key) = args.openai_key {
        engine = engine.with_generator(Arc::new(
            lorekeeper::facts::generate::OpenAiGenerator::with_config(
                key,
                args.api_base_url,
                None,
            ),
        ));
        tracing::info!("fact generation enabled");
    }

    let state = Arc::new(AppState {
        engine,
        retriever,
        sessions: Arc::new(MemorySessionStore::new()),
    });

    tracing::info!(
        corpus_size = state.engine.store().len(),
        "lorekeeper server starting"
    );
    serve(state, args.port).await?;

    Ok(())
}
