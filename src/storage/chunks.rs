//! Chunk queries
//!
//! All functions take a `&Connection` and are called through
//! [`ChunkStorage::with_connection`](super::ChunkStorage::with_connection).
//! Similarity search scans the owner's active chunks and ranks them in
//! Rust; at personal-assistant scale (thousands of chunks per user)
//! this stays well under a millisecond.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::embedding::cosine_similarity;
use crate::error::Result;
use crate::types::{ChunkSource, KnowledgeChunk, RetrievedChunk};

/// Serialize an embedding as little-endian f32 bytes
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

/// Deserialize an embedding blob; trailing partial floats are dropped
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeChunk> {
    let source_str: String = row.get("source")?;
    let created_str: String = row.get("created_at")?;
    let blob: Vec<u8> = row.get("embedding")?;

    Ok(KnowledgeChunk {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        source: source_str.parse().unwrap_or_default(),
        content: row.get("content")?,
        embedding: blob_to_embedding(&blob),
        importance: row.get("importance")?,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        is_active: row.get::<_, i64>("is_active")? != 0,
    })
}

/// Insert a new chunk
pub fn insert_chunk(conn: &Connection, chunk: &KnowledgeChunk) -> Result<()> {
    conn.execute(
        "INSERT INTO knowledge_chunks
         (id, user_id, source, content, embedding, importance, created_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            chunk.id,
            chunk.user_id,
            chunk.source.to_string(),
            chunk.content,
            embedding_to_blob(&chunk.embedding),
            chunk.importance,
            chunk.created_at.to_rfc3339(),
            chunk.is_active as i64,
        ],
    )?;
    Ok(())
}

/// Logically delete a chunk. Returns whether a row was affected.
pub fn deactivate_chunk(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE knowledge_chunks SET is_active = 0 WHERE id = ?1",
        params![id],
    )?;
    Ok(affected > 0)
}

/// Number of active chunks owned by a user
pub fn count_active(conn: &Connection, user_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM knowledge_chunks WHERE user_id = ?1 AND is_active = 1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Top-k cosine similarity search over a user's active chunks
///
/// Ordered by similarity descending; ties go to the most recently
/// created chunk. A user with no chunks gets an empty list, not an
/// error.
pub fn search_similar(
    conn: &Connection,
    user_id: &str,
    query_embedding: &[f32],
    top_k: usize,
) -> Result<Vec<RetrievedChunk>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, source, content, embedding, importance, created_at, is_active
         FROM knowledge_chunks
         WHERE user_id = ?1 AND is_active = 1",
    )?;

    let mut scored: Vec<RetrievedChunk> = stmt
        .query_map(params![user_id], chunk_from_row)?
        .filter_map(|r| r.ok())
        .map(|chunk| {
            let similarity = cosine_similarity(query_embedding, &chunk.embedding);
            RetrievedChunk { chunk, similarity }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.chunk.created_at.cmp(&a.chunk.created_at))
    });
    scored.truncate(top_k);

    Ok(scored)
}

/// Construct a chunk value ready for insertion
pub fn new_chunk(
    user_id: &str,
    source: ChunkSource,
    content: &str,
    embedding: Vec<f32>,
    importance: f32,
) -> KnowledgeChunk {
    KnowledgeChunk {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        source,
        content: content.to_string(),
        embedding,
        importance: importance.clamp(0.0, 1.0),
        created_at: Utc::now(),
        is_active: true,
    }
}
