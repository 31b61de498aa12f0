//! # Post Chunking Module
//!
//! Splits post content into overlapping chunks small enough to embed.
//!
//! ## Chunking Strategy
//!
//! The splitter works recursively over a list of separators, coarsest first:
//! blank lines, then line breaks, then spaces, then single characters.
//! 1. Split the text on the first separator it contains, keeping the separator
//!    at the start of the following piece so no text is lost
//! 2. Merge consecutive pieces greedily while they fit in `chunk_size`
//! 3. When a chunk is emitted, keep its trailing pieces (at most
//!    `chunk_overlap` characters) as the start of the next one
//! 4. Pieces that are too large on their own are split again with the next
//!    separator
//!
//! Sizes are counted in characters, not bytes.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::archive::Post;
use crate::processor::ChunkOptions;
use crate::processor::error::ProcessError;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk of one post's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostChunk {
    /// Index of the post in the archive
    pub post_index: usize,

    /// Position of the chunk within the post
    pub position: usize,

    /// The text of the chunk
    pub text: String,
}

/// Chunk every post of an archive, in archive order
#[instrument(skip(posts), fields(posts = posts.len()))]
pub fn chunk_posts(posts: &[Post], options: &ChunkOptions) -> Result<Vec<PostChunk>, ProcessError> {
    options.validate()?;

    let mut chunks = Vec::new();
    for (post_index, post) in posts.iter().enumerate() {
        for (position, text) in split_text(&post.content, options).into_iter().enumerate() {
            chunks.push(PostChunk {
                post_index,
                position,
                text,
            });
        }
    }

    debug!("Created {} chunks from {} posts", chunks.len(), posts.len());
    Ok(chunks)
}

/// Split a single text into chunks
pub fn split_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    split_recursive(text, &SEPARATORS, options)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_recursive(text: &str, separators: &[&str], options: &ChunkOptions) -> Vec<String> {
    // Use the first separator that occurs in the text; "" always matches
    let (index, separator) = separators
        .iter()
        .enumerate()
        .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
        .map(|(i, sep)| (i, *sep))
        .unwrap_or((separators.len().saturating_sub(1), ""));
    let finer = &separators[(index + 1).min(separators.len())..];

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();
    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < options.chunk_size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, options));
            fitting.clear();
        }
        if finer.is_empty() {
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
        } else {
            chunks.extend(split_recursive(piece, finer, options));
        }
    }
    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, options));
    }

    chunks
}

/// Split on `separator`, attaching each separator to the piece after it
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Greedily merge pieces into chunks with overlap
fn merge_pieces(pieces: &[&str], options: &ChunkOptions) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut total = 0;

    for piece in pieces {
        let len = char_len(piece);
        if total + len > options.chunk_size && !current.is_empty() {
            push_chunk(&mut chunks, &current);

            // Keep the tail of the emitted chunk as overlap
            while total > options.chunk_overlap
                || (total + len > options.chunk_size && total > 0)
            {
                let first = current.remove(0);
                total -= char_len(first);
            }
        }
        current.push(piece);
        total += len;
    }
    push_chunk(&mut chunks, &current);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, pieces: &[&str]) {
    let chunk = pieces.concat();
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}
