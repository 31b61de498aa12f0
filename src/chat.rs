//! # Thread Chat Module
//!
//! Question answering over an indexed thread. Each question is embedded,
//! matched against stored chunks, and answered by the completion model with
//! the matching posts as context and the conversation so far as history.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use threadvault::chat::{ChatConfig, ThreadChat};
//! use threadvault::index::Database;
//! use threadvault::model::{DEFAULT_COMPLETION_MODEL, OpenAiClient};
//! use rig::embeddings::EmbeddingModel;
//!
//! # async fn run() -> threadvault::Result<()> {
//! let client = OpenAiClient::new_openai_from_env(DEFAULT_COMPLETION_MODEL)?;
//! let db = Database::new_from_path(Path::new("forum_index.db"), client.embedding().ndims()).await?;
//! let mut chat = ThreadChat::new(db, client, ChatConfig::default());
//!
//! let answer = chat.ask("Which mill made the cloth?").await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use rig::message::Message;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::index::Database;
use crate::model::Client;
use crate::search::{
    DEFAULT_TEMPERATURE, SearchError, SearchOptions, SourcePost, generate_answer_with_rag,
    search_index_with_client, sources_from_chunks,
};

/// Settings for a chat session
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub search: SearchOptions,
    pub temperature: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ChatConfig {
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    /// Number of chunks retrieved per question
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.search.limit = limit;
        self
    }

    /// Only answer from the thread with this URL
    pub fn thread_filter(mut self, url: Option<String>) -> Self {
        self.config.search.thread_filter = url;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn build(self) -> Result<ChatConfig> {
        if self.config.search.limit == 0 {
            return Err(Error::Config("limit must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.config.temperature) {
            return Err(Error::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.config.temperature
            )));
        }
        Ok(self.config)
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// The answer to a question with the posts it was drawn from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourcePost>,
}

/// A conversation about the indexed threads
pub struct ThreadChat<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    db: Database,
    client: Client<C, E>,
    config: ChatConfig,
    history: Vec<ChatTurn>,
}

impl<C, E> ThreadChat<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(db: Database, client: Client<C, E>, config: ChatConfig) -> Self {
        Self {
            db,
            client,
            config,
            history: Vec::new(),
        }
    }

    /// Answer a question. Only successful answers are added to the history.
    #[instrument(skip(self), fields(history = self.history.len()))]
    pub async fn ask(&mut self, question: &str) -> Result<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SearchError::InvalidParameters("question is empty".to_string()).into());
        }

        let chunks =
            search_index_with_client(&self.db, &self.client, question, &self.config.search)
                .await?;
        let sources = sources_from_chunks(&chunks);

        let answer = generate_answer_with_rag(
            self.client.completion(),
            question,
            &sources,
            self.history_messages(),
            self.config.temperature,
        )
        .await?;

        info!("Answered with {} sources", sources.len());
        self.history.push(ChatTurn {
            question: question.to_string(),
            answer: answer.clone(),
        });

        Ok(ChatAnswer {
            question: question.to_string(),
            answer,
            sources,
        })
    }

    /// Turns answered so far, oldest first
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn history_messages(&self) -> Vec<Message> {
        self.history
            .iter()
            .flat_map(|turn| {
                [
                    Message::user(turn.question.clone()),
                    Message::assistant(turn.answer.clone()),
                ]
            })
            .collect()
    }
}
