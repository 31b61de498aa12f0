//! # Post Index Module
//!
//! Stores archived posts and their chunk embeddings in a local libsql
//! database and answers nearest-neighbour queries with libsql's vector
//! functions.
//!
//! ## Key Components
//!
//! - `Database`: Connection wrapper with the index operations
//! - `index_archive`: Chunk, embed and store a scraped archive
//! - `IndexedThread`: Summary of one indexed archive
//! - `RetrievedChunk`: A chunk returned by a similarity query, with its post
//!
//! Re-indexing a thread replaces everything stored for its URL.

mod database;
pub mod error;
mod indexer;
mod schema;

pub use database::{Database, vector_literal};
pub use error::DbError;
pub use indexer::{IndexConfig, IndexConfigBuilder, IndexSummary, index_archive, index_chunks};

use serde::Serialize;

/// An archive stored in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedThread {
    /// ID of the thread
    pub id: i64,

    /// URL of the thread
    pub url: String,

    /// When the archive was scraped (RFC 3339)
    pub scrape_date: String,

    /// When the archive was indexed (Unix seconds)
    pub indexed_at: i64,

    /// Number of posts stored
    pub post_count: i64,

    /// Number of chunks stored
    pub chunk_count: i64,
}

/// A chunk returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    /// ID of the chunk
    pub chunk_id: i64,

    /// Text of the chunk
    pub text: String,

    /// Cosine distance to the query, smaller is closer
    pub distance: f64,

    /// Position of the post in its archive
    pub post_position: i64,

    /// Forum post number
    pub post_number: Option<String>,

    /// Author of the post
    pub username: Option<String>,

    /// Timestamp of the post
    pub date: Option<String>,
}
