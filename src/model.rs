//! # LLM Client Module
//!
//! A pair of hosted models, one for chat completions and one for embeddings,
//! behind client-side rate limiters. The chat side of the crate only talks to
//! models through this type, which keeps providers swappable and lets tests
//! plug in mocks.
//!
//! ## Key Components
//!
//! - `Client`: Wraps a completion model and an embedding model
//! - `RateLimitedCompletionModel` / `RateLimitedEmbeddingModel`: `governor`
//!   limited wrappers around any rig model
//! - `mock_model`: Offline models for tests

use rig::{completion::CompletionModel, embeddings::EmbeddingModel, providers::openai};

use crate::error::{Error, Result};

pub mod mock_model;
pub mod ratelimited;

pub use ratelimited::{RateLimitedCompletionModel, RateLimitedEmbeddingModel, RateLimits};

/// Default chat completion model
pub const DEFAULT_COMPLETION_MODEL: &str = openai::GPT_4O;

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = openai::TEXT_EMBEDDING_ADA_002;

/// Vector size of `DEFAULT_EMBEDDING_MODEL`
pub const DEFAULT_EMBEDDING_DIMS: usize = 1536;

/// Environment variable holding the OpenAI API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

pub type OpenAiCompletionModel = RateLimitedCompletionModel<openai::CompletionModel>;
pub type OpenAiEmbeddingModel = RateLimitedEmbeddingModel<openai::EmbeddingModel>;

/// Client backed by the OpenAI API
pub type OpenAiClient = Client<OpenAiCompletionModel, OpenAiEmbeddingModel>;

impl OpenAiClient {
    /// Build a client from `OPENAI_API_KEY`
    pub fn new_openai_from_env(completion_model: &str) -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| Error::Config(format!("{} environment variable must be set", API_KEY_VAR)))?;
        let openai_client = openai::Client::new(&api_key);
        Ok(Self::new_openai(
            openai_client,
            completion_model,
            RateLimits::default(),
        ))
    }

    pub fn new_openai(
        openai_client: openai::Client,
        completion_model: &str,
        limits: RateLimits,
    ) -> Self {
        Self::new(
            RateLimitedCompletionModel::new(
                openai_client.completion_model(completion_model),
                limits.completions_per_minute,
            ),
            RateLimitedEmbeddingModel::new(
                openai_client.embedding_model(DEFAULT_EMBEDDING_MODEL),
                limits.embeddings_per_minute,
            ),
        )
    }
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}
