//! # Content Processor Module
//!
//! Prepares archived posts for the index: posts are chunked and the chunks
//! embedded through the model client, ready for the index module to store.
//!
//! ## Key Components
//!
//! - `ChunkOptions`: Chunk size and overlap, in characters
//! - `PostChunk`: A chunk tagged with its post and position
//! - `chunk_posts` / `split_text`: The recursive character splitter
//! - `embed_chunks`: Batched, order-preserving embedding of chunks

mod chunking;
mod config;
mod embedding;
mod error;

pub use chunking::{PostChunk, chunk_posts, split_text};
pub use config::ChunkOptions;
pub use embedding::{EmbeddedChunk, embed_chunks};
pub use error::ProcessError;
