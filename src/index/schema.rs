//! # Database Schema Module
//!
//! Three tables:
//! 1. `threads` - one row per indexed archive, unique by thread URL
//! 2. `posts` - the archived posts, in archive order
//! 3. `chunks` - post chunks with their embeddings as libsql vectors
//!
//! The embedding column is declared with the embedding model's dimensions, so
//! a database file is tied to one embedding model.

use crate::index::error::DbError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection, dimensions: usize) -> Result<(), DbError> {
    if dimensions == 0 {
        return Err(DbError::Schema(
            "embedding dimensions must be positive".to_string(),
        ));
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS threads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            scrape_date TEXT NOT NULL,
            indexed_at INTEGER NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create threads table: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            post_number TEXT,
            username TEXT,
            date TEXT,
            content TEXT NOT NULL,
            FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create posts table: {}", e)))?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding F32_BLOB({}) NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            )",
            dimensions
        ),
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create chunks table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_posts_thread_id ON posts(thread_id)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on posts: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_chunks_post_id ON chunks(post_id)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on chunks: {}", e)))?;

    Ok(())
}
