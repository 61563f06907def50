//! RAG knowledge retrieval
//!
//! Embeds a query, runs a user-scoped similarity search, and returns
//! the top matches for prompt injection. Retrieval never hard-fails
//! the calling chat request: embedding timeouts and store errors
//! degrade to an empty result.

use std::sync::Arc;
use std::time::Duration;

use crate::embedding::{Embedder, EmbeddingCache};
use crate::error::{LoreError, Result};
use crate::storage::{chunks, ChunkStorage};
use crate::types::{ChunkSource, KnowledgeChunk, RetrievalConfig, RetrievedChunk};

/// Retrieval front-end over the embedder and chunk store
pub struct KnowledgeRetriever {
    storage: ChunkStorage,
    embedder: Arc<dyn Embedder>,
    cache: EmbeddingCache,
    config: RetrievalConfig,
}

impl KnowledgeRetriever {
    pub fn new(storage: ChunkStorage, embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(storage, embedder, RetrievalConfig::default())
    }

    pub fn with_config(
        storage: ChunkStorage,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            storage,
            embedder,
            cache: EmbeddingCache::default(),
            config,
        }
    }

    /// Embed text, going through the query cache and enforcing the
    /// configured timeout
    async fn embed_with_timeout(&self, text: &str) -> Result<Arc<Vec<f32>>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached);
        }

        let timeout = Duration::from_secs(self.config.embed_timeout_secs);
        let embedding = tokio::time::timeout(timeout, self.embedder.embed(text))
            .await
            .map_err(|_| LoreError::Timeout(self.config.embed_timeout_secs))??;

        Ok(self.cache.put(text, embedding))
    }

    /// Return the most relevant active chunks for a user's query
    ///
    /// Degrades to an empty list on embedding or storage failure; a
    /// user with zero chunks gets an empty list without error.
    pub async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Vec<RetrievedChunk> {
        let k = top_k
            .unwrap_or(self.config.top_k)
            .min(self.config.max_top_k);

        let query_embedding = match self.embed_with_timeout(query).await {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "query embedding failed; proceeding without context");
                return Vec::new();
            }
        };

        match self
            .storage
            .with_connection(|conn| chunks::search_similar(conn, user_id, &query_embedding, k))
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "chunk search failed; proceeding without context");
                Vec::new()
            }
        }
    }

    /// Embed and store new user content
    ///
    /// Unlike retrieval, ingestion surfaces failures: the caller needs
    /// to know the content was not indexed.
    pub async fn ingest(
        &self,
        user_id: &str,
        source: ChunkSource,
        content: &str,
        importance: f32,
    ) -> Result<KnowledgeChunk> {
        if content.trim().is_empty() {
            return Err(LoreError::InvalidInput("empty chunk content".to_string()));
        }

        let embedding = self.embed_with_timeout(content).await?;
        let chunk = chunks::new_chunk(user_id, source, content, (*embedding).clone(), importance);
        self.storage
            .with_connection(|conn| chunks::insert_chunk(conn, &chunk))?;

        tracing::debug!(user_id, chunk_id = %chunk.id, %source, "ingested chunk");
        Ok(chunk)
    }

    /// Logically remove a chunk from retrieval
    pub fn deactivate(&self, chunk_id: &str) -> Result<bool> {
        self.storage
            .with_connection(|conn| chunks::deactivate_chunk(conn, chunk_id))
    }

    /// Active chunk count for a user
    pub fn active_count(&self, user_id: &str) -> Result<i64> {
        self.storage
            .with_connection(|conn| chunks::count_active(conn, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::TfIdfEmbedder;
    use async_trait::async_trait;

    fn test_retriever() -> KnowledgeRetriever {
        let storage = ChunkStorage::open_in_memory().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(TfIdfEmbedder::new(256));
        KnowledgeRetriever::new(storage, embedder)
    }

    /// Embedder that always fails, for degradation tests
    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(LoreError::Embedding("backend down".to_string()))
        }

        fn dimensions(&self) -> usize {
            256
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_ingest_then_retrieve() {
        let retriever = test_retriever();

        retriever
            .ingest("zach", ChunkSource::Conversation, "The party fought a young green dragon in session twelve.", 0.7)
            .await
            .unwrap();
        retriever
            .ingest("zach", ChunkSource::Manual, "Grocery list: milk, eggs, coffee beans.", 0.2)
            .await
            .unwrap();

        let results = retriever
            .retrieve("zach", "what dragon did the party fight?", Some(1))
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].chunk.content.contains("green dragon"));
    }

    #[tokio::test]
    async fn test_retrieve_with_zero_chunks_is_empty_not_error() {
        let retriever = test_retriever();
        let results = retriever.retrieve("rebecca", "anything", None).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_empty() {
        let storage = ChunkStorage::open_in_memory().unwrap();
        let retriever = KnowledgeRetriever::new(storage, Arc::new(BrokenEmbedder));

        let results = retriever.retrieve("zach", "any query", None).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_failure_surfaces() {
        let storage = ChunkStorage::open_in_memory().unwrap();
        let retriever = KnowledgeRetriever::new(storage, Arc::new(BrokenEmbedder));

        assert!(retriever
            .ingest("zach", ChunkSource::Manual, "some content", 0.5)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_content() {
        let retriever = test_retriever();
        assert!(retriever
            .ingest("zach", ChunkSource::Manual, "   ", 0.5)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_top_k_is_capped() {
        let retriever = test_retriever();
        for i in 0..3 {
            retriever
                .ingest("zach", ChunkSource::Manual, &format!("note number {}", i), 0.5)
                .await
                .unwrap();
        }

        let results = retriever.retrieve("zach", "note", Some(10_000)).await;
        // Caps at max_top_k, and naturally at the corpus size here
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_deactivate_removes_from_retrieval() {
        let retriever = test_retriever();
        let chunk = retriever
            .ingest("zach", ChunkSource::Manual, "session notes about the lich's phylactery", 0.9)
            .await
            .unwrap();

        assert_eq!(retriever.active_count("zach").unwrap(), 1);
        assert!(retriever.deactivate(&chunk.id).unwrap());
        assert_eq!(retriever.active_count("zach").unwrap(), 0);

        let results = retriever.retrieve("zach", "phylactery", None).await;
        assert!(results.is_empty());
    }
}
