//! Error types for the archive module

use crate::error::Error as CrateError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for archive persistence
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Writing one of the output files failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an archive file failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ArchiveError> for CrateError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Json(e) => CrateError::Json(e),
            _ => CrateError::Archive(err.to_string()),
        }
    }
}
