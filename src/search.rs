//! # Retrieval Module
//!
//! The "retrieval" half of the thread chat: embeds a question, pulls the
//! closest chunks out of the index and turns them into prompt context and
//! source cards.
//!
//! ## Search Process
//!
//! 1. Convert the question to an embedding vector
//! 2. Fetch the nearest chunks by cosine distance
//! 3. Drop chunks whose text was already retrieved
//! 4. Number the remaining posts into a context block
//! 5. Ask the completion model, passing earlier turns as history

mod error;
mod search_impl;

pub use error::SearchError;
pub use search_impl::{
    DEFAULT_TEMPERATURE, PREAMBLE, SearchOptions, SourcePost, build_prompt,
    generate_answer_with_rag, prepare_rag_context, search_index_with_client, sources_from_chunks,
};
