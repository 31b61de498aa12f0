//! # threadvault - Forum Thread Archiver with Retrieval Chat
//!
//! Scrapes a paginated forum thread into a JSON archive and a plain-text
//! mirror, then lets you ask questions about it: posts are chunked, embedded
//! and stored in a local libsql database, and answers come from a hosted chat
//! model with the closest posts as context.
//!
//! ## Features
//!
//! - Sequential, throttled thread scraping with configurable selectors
//! - Best-effort post extraction that never aborts a run
//! - JSON archive and text mirror output
//! - Recursive character chunking with overlap
//! - Rate-limited embedding and completion models
//! - Vector similarity search with LibSQL
//! - Multi-turn chat with source posts shown next to each answer
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use threadvault::archive::{ThreadArchive, write_archive};
//! use threadvault::crawler::{ScraperConfig, scrape_thread};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = "https://forum.example/threads/tweed-jackets.1234/";
//!     let config = ScraperConfig::builder(url).end_page(Some(3)).build();
//!
//!     let outcome = scrape_thread(&config).await?;
//!     println!("Stopped: {}", outcome.stop_reason);
//!
//!     let archive = ThreadArchive::new(url, outcome.posts);
//!     write_archive(&archive, Path::new("forum_data.json"), Path::new("forum_data.txt")).await?;
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

pub mod archive;
pub mod crawler;

// Chat feature modules
pub mod chat;
pub mod index;
pub mod processor;
pub mod render;
pub mod search;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::archive::{Post, ThreadArchive};
    pub use crate::chat::{ChatAnswer, ChatConfig, ThreadChat};
    pub use crate::error::Error;
    pub use crate::error::Result;
}
