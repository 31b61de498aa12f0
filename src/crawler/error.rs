//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A configured selector could not be parsed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::Selector { .. } | CrawlError::UrlParse(_) => {
                CrateError::Config(err.to_string())
            }
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}

/// Recoverable failure while pulling fields out of a post
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The post container has no message body, so the post is skipped
    #[error("post has no message body")]
    MissingBody,

    /// A single field could not be found; the field is left empty
    #[error("post has no {0}")]
    MissingField(&'static str),
}
