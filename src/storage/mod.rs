//! Knowledge chunk store
//!
//! SQLite-backed, append-mostly: chunks are inserted at ingestion and
//! only ever logically deactivated, never rewritten or physically
//! deleted.

pub mod chunks;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use crate::error::Result;
use crate::types::StorageConfig;

/// Chunk storage wrapping a SQLite connection
#[derive(Clone)]
pub struct ChunkStorage {
    conn: Arc<Mutex<Connection>>,
}

impl ChunkStorage {
    /// Open or create the database
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let conn = if config.db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(&config.db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(&config.db_path, flags)?
        };

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA busy_timeout=30000;
            PRAGMA temp_store=MEMORY;
            PRAGMA foreign_keys=ON;
            "#,
        )?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StorageConfig::default())
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_chunks (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                source      TEXT NOT NULL,
                content     TEXT NOT NULL,
                embedding   BLOB NOT NULL,
                importance  REAL NOT NULL DEFAULT 0.5,
                created_at  TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_user_active
                ON knowledge_chunks(user_id, is_active);
            "#,
        )?;
        Ok(())
    }

    /// Execute a function with the connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }
}
