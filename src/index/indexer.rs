//! Chunk, embed and store an archive

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::archive::ThreadArchive;
use crate::error::{Error, Result};
use crate::index::Database;
use crate::model::Client;
use crate::processor::{ChunkOptions, PostChunk, chunk_posts, embed_chunks};

/// Settings for indexing an archive
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub chunk_options: ChunkOptions,

    /// Maximum number of embedding batches in flight
    pub concurrency: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_options: ChunkOptions::default(),
            concurrency: 4,
        }
    }
}

impl IndexConfig {
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_options.chunk_size = chunk_size;
        self
    }

    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.config.chunk_options.chunk_overlap = chunk_overlap;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn build(self) -> Result<IndexConfig> {
        if self.config.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        self.config.chunk_options.validate()?;
        Ok(self.config)
    }
}

/// What an indexing run stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub thread_id: i64,
    pub posts: usize,
    pub chunks: usize,
}

/// Index an archive, replacing any earlier index of the same thread
pub async fn index_archive<C, E>(
    client: &Client<C, E>,
    db: &Database,
    archive: &ThreadArchive,
    config: &IndexConfig,
    progress: Option<mpsc::Sender<usize>>,
) -> Result<IndexSummary>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    let chunks = chunk_posts(&archive.posts, &config.chunk_options)?;
    index_chunks(client, db, archive, chunks, config.concurrency, progress).await
}

/// Embed already chunked posts and store them with the archive.
///
/// Lets callers size a progress display from `chunks.len()` first.
#[instrument(skip_all, fields(url = %archive.thread_url, chunks = chunks.len()))]
pub async fn index_chunks<C, E>(
    client: &Client<C, E>,
    db: &Database,
    archive: &ThreadArchive,
    chunks: Vec<PostChunk>,
    concurrency: usize,
    progress: Option<mpsc::Sender<usize>>,
) -> Result<IndexSummary>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    let embedded = embed_chunks(client, chunks, concurrency, progress).await?;
    let thread_id = db.replace_thread(archive, &embedded).await?;

    info!(
        "Stored thread {} with {} chunks",
        archive.thread_url,
        embedded.len()
    );
    Ok(IndexSummary {
        thread_id,
        posts: archive.posts.len(),
        chunks: embedded.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Post;
    use crate::model::mock_model::{MockCompletionModel, MockEmbeddingModel};
    use tempfile::tempdir;

    fn post(number: &str, content: &str) -> Post {
        Post {
            post_number: Some(number.to_string()),
            username: Some("alice".to_string()),
            date: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_index_config_builder() {
        let config = IndexConfig::builder()
            .chunk_size(500)
            .chunk_overlap(50)
            .concurrency(2)
            .build()
            .unwrap();

        assert_eq!(config.chunk_options.chunk_size, 500);
        assert_eq!(config.chunk_options.chunk_overlap, 50);
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn test_index_config_rejects_bad_values() {
        assert!(IndexConfig::builder().concurrency(0).build().is_err());
        assert!(
            IndexConfig::builder()
                .chunk_size(100)
                .chunk_overlap(100)
                .build()
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_index_archive() {
        let temp_dir = tempdir().unwrap();
        let db = Database::new_from_path(&temp_dir.path().join("index.db"), 32)
            .await
            .unwrap();
        let client = Client::new(MockCompletionModel::new(), MockEmbeddingModel::new(32));
        let archive = ThreadArchive::new(
            "https://forum.example/threads/t.1/",
            vec![
                post("1", "First post"),
                post("2", ""),
                post("3", "Third post"),
            ],
        );
        let (tx, mut rx) = mpsc::channel(8);

        let summary = index_archive(&client, &db, &archive, &IndexConfig::default(), Some(tx))
            .await
            .unwrap();

        assert_eq!(summary.posts, 3);
        // The empty post yields no chunk
        assert_eq!(summary.chunks, 2);

        let mut reported = 0;
        while let Some(n) = rx.recv().await {
            reported += n;
        }
        assert_eq!(reported, 2);

        let threads = db.list_threads().await.unwrap();
        assert_eq!(threads[0].post_count, 3);
        assert_eq!(threads[0].chunk_count, 2);
    }
}
