//! # Processor Configuration Module
//!
//! Controls how post content is cut into chunks before embedding. Chunk size
//! and overlap are counted in characters.

use crate::processor::error::ProcessError;

/// Configuration for chunking post text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum size of a chunk in characters
    pub chunk_size: usize,

    /// Characters carried over from the end of one chunk to the next
    pub chunk_overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkOptions {
    /// Create options, rejecting an overlap that is not smaller than the chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ProcessError> {
        let options = Self {
            chunk_size,
            chunk_overlap,
        };
        options.validate()?;
        Ok(options)
    }

    /// Check that the options can produce chunks
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.chunk_size == 0 {
            return Err(ProcessError::Config("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ProcessError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ChunkOptions::default();
        assert_eq!(options.chunk_size, 1000);
        assert_eq!(options.chunk_overlap, 200);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        assert!(ChunkOptions::new(100, 100).is_err());
        assert!(ChunkOptions::new(0, 0).is_err());
        assert!(ChunkOptions::new(100, 99).is_ok());
    }
}
