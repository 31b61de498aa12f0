//! Client-side rate limiting for rig models
//!
//! Both wrappers wait on a `governor` limiter before forwarding the call, so a
//! large indexing run queues up instead of tripping the provider's quota.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, debug_span, info_span};

/// Requests per minute allowed for each model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub completions_per_minute: NonZeroU32,
    pub embeddings_per_minute: NonZeroU32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            completions_per_minute: NonZeroU32::new(500).unwrap_or(NonZeroU32::MIN),
            embeddings_per_minute: NonZeroU32::new(3000).unwrap_or(NonZeroU32::MIN),
        }
    }
}

fn limiter(per_minute: NonZeroU32) -> Arc<DefaultDirectRateLimiter> {
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Completion model that waits for a rate limiter before each request
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M: CompletionModel> RateLimitedCompletionModel<M> {
    pub fn new(model: M, per_minute: NonZeroU32) -> Self {
        Self {
            model,
            limiter: limiter(per_minute),
        }
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = M::Response;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        self.model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await
    }
}

/// Embedding model that waits for a rate limiter before each batch
#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M: EmbeddingModel> RateLimitedEmbeddingModel<M> {
    pub fn new(model: M, per_minute: NonZeroU32) -> Self {
        Self {
            model,
            limiter: limiter(per_minute),
        }
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        self.model
            .embed_texts(texts)
            .instrument(info_span!("embed_texts"))
            .await
    }
}
