//! Error types for the processor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Invalid chunking configuration
    #[error("Invalid chunk options: {0}")]
    Config(String),

    /// Embedding generation error
    #[error("Embedding generation error: {0}")]
    EmbeddingGeneration(#[from] rig::embeddings::EmbeddingError),

    /// The embedding model returned a different number of vectors than requested
    #[error("Embedding processing error: {0}")]
    EmbeddingProcessing(String),
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Config(_) => CrateError::Config(err.to_string()),
            _ => CrateError::Process(err.to_string()),
        }
    }
}

