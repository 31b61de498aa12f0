//! Search implementation for RAG functionality

use std::collections::HashSet;

use rig::agent::AgentBuilder;
use rig::completion::{Chat, CompletionModel};
use rig::embeddings::EmbeddingModel;
use rig::message::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::SearchError;
use crate::index::{Database, RetrievedChunk};
use crate::model::Client;

/// Instructions given to the completion model ahead of every conversation
pub const PREAMBLE: &str = "You are a helpful assistant answering questions about a forum \
thread. Answer using the forum posts provided as context. If the posts do not contain the \
answer, say so instead of guessing. Mention the post number when you rely on a post.";

/// Sampling temperature for answers
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Options for search queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of chunks to retrieve
    pub limit: usize,

    /// Only search the thread with this URL
    pub thread_filter: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 3,
            thread_filter: None,
        }
    }
}

/// A retrieved post shown next to an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePost {
    pub post_number: Option<String>,
    pub username: Option<String>,
    pub date: Option<String>,
    pub text: String,
}

impl From<&RetrievedChunk> for SourcePost {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            post_number: chunk.post_number.clone(),
            username: chunk.username.clone(),
            date: chunk.date.clone(),
            text: chunk.text.clone(),
        }
    }
}

/// Embed `query` and fetch the nearest chunks from the index
#[instrument(skip(db, client, options))]
pub async fn search_index_with_client<C, E>(
    db: &Database,
    client: &Client<C, E>,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<RetrievedChunk>, SearchError>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    if options.limit == 0 {
        return Err(SearchError::InvalidParameters(
            "limit must be at least 1".to_string(),
        ));
    }

    let query_embedding = client
        .embedding()
        .embed_text(query)
        .await
        .map_err(|e| SearchError::Embedding(format!("Failed to generate embedding: {}", e)))?;

    let chunks = db
        .nearest_chunks(
            &query_embedding.vec,
            options.limit,
            options.thread_filter.as_deref(),
        )
        .await?;

    debug!("Found {} chunks for query", chunks.len());
    Ok(chunks)
}

/// Turn retrieved chunks into source posts, dropping repeated texts.
/// The first occurrence wins, so the closest match keeps its place.
pub fn sources_from_chunks(chunks: &[RetrievedChunk]) -> Vec<SourcePost> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|chunk| seen.insert(chunk.text.as_str()))
        .map(SourcePost::from)
        .collect()
}

/// Render sources as numbered context blocks for the prompt
pub fn prepare_rag_context(sources: &[SourcePost]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            format!(
                "[{}] Post #{} by {} on {}:\n{}",
                i + 1,
                source.post_number.as_deref().unwrap_or("unknown"),
                source.username.as_deref().unwrap_or("unknown"),
                source.date.as_deref().unwrap_or("unknown"),
                source.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user prompt from the question and prepared context
pub fn build_prompt(question: &str, context: &str) -> String {
    let context = if context.is_empty() {
        "(no matching posts were found)"
    } else {
        context
    };

    format!(
        "Forum posts:\n\n{}\n\nQuestion: {}",
        context,
        question.trim()
    )
}

/// Ask the completion model to answer `question` from `sources`, with the
/// earlier conversation as history
#[instrument(skip(model, sources, history), fields(sources = sources.len(), history = history.len()))]
pub async fn generate_answer_with_rag<C>(
    model: &C,
    question: &str,
    sources: &[SourcePost],
    history: Vec<Message>,
    temperature: f64,
) -> Result<String, SearchError>
where
    C: CompletionModel,
{
    let agent = AgentBuilder::new(model.clone())
        .preamble(PREAMBLE)
        .temperature(temperature)
        .build();

    let prompt = build_prompt(question, &prepare_rag_context(sources));
    let answer = agent.chat(prompt.as_str(), history).await?;

    Ok(answer)
}
