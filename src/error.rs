//! Error types for the threadvault crate

use thiserror::Error;

/// Result type for threadvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for threadvault operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or terminal I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Thread scraping error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Archive persistence error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Content processing error
    #[error("Process error: {0}")]
    Process(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Search error
    #[error("Search error: {0}")]
    Search(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
