//! # Mock Models for Testing
//!
//! `MockCompletionModel` returns a canned answer and counts how often it was
//! called. `MockEmbeddingModel` produces deterministic bag-of-words vectors, so
//! texts sharing words end up close together without any network access.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
    one_or_many::OneOrMany,
};
use tokio::sync::Mutex;

/// A completion model that always answers with a preset text
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    response: Arc<Mutex<String>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers with `text`
    pub fn with_text(text: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(text.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the answer for subsequent calls
    pub async fn set_text_response(&self, text: &str) {
        *self.response.lock().await = text.to_string();
    }

    /// Number of completion requests received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.response.lock().await.clone();
        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&text)),
            raw_response: text,
        })
    }
}

/// An embedding model that hashes lowercase words into a fixed number of buckets
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    ndims: usize,
    batches: Arc<AtomicUsize>,
}

impl MockEmbeddingModel {
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims,
            batches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `embed_texts` calls received so far
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Embed one text without going through the trait
    pub fn vector(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |acc, b| {
                    (acc ^ b as u64).wrapping_mul(0x100000001b3)
                });
            vec[(hash % self.ndims as u64) as usize] += 1.0;
        }
        // Keep every vector non-zero so cosine distance is defined
        if vec.iter().all(|v| *v == 0.0) {
            vec[0] = 1e-3;
        }
        vec
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 4;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .into_iter()
            .map(|text| Embedding {
                vec: self.vector(&text),
                document: text,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_embedding_is_deterministic() {
        let model = MockEmbeddingModel::new(16);
        assert_eq!(model.vector("Tweed Jacket"), model.vector("tweed jacket"));
        assert_eq!(model.vector("tweed").len(), 16);
    }

    #[test]
    fn test_mock_embedding_never_zero() {
        let model = MockEmbeddingModel::new(4);
        assert!(model.vector("...").iter().any(|v| *v != 0.0));
    }
}
