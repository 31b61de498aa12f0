//! Embedding generation for post chunks

use futures::{StreamExt, TryStreamExt, stream};
use rig::completion::CompletionModel;
use rig::embeddings::{Embedding, EmbeddingModel};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::model::Client;
use crate::processor::PostChunk;
use crate::processor::error::ProcessError;

/// A chunk together with its embedding
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: PostChunk,
    pub embedding: Embedding,
}

/// Embed chunks in batches of the model's `MAX_DOCUMENTS`.
///
/// Up to `concurrency` batches are in flight at once; the output keeps the
/// input order. After each batch the number of chunks it held is sent on
/// `progress`, if given.
#[instrument(skip(client, chunks, progress), fields(chunks = chunks.len()))]
pub async fn embed_chunks<C, E>(
    client: &Client<C, E>,
    chunks: Vec<PostChunk>,
    concurrency: usize,
    progress: Option<mpsc::Sender<usize>>,
) -> Result<Vec<EmbeddedChunk>, ProcessError>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    let batch_size = E::MAX_DOCUMENTS.max(1);
    let mut batches = Vec::new();
    let mut iter = chunks.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(batch_size).collect::<Vec<_>>());
    }
    debug!("Embedding {} batches of up to {}", batches.len(), batch_size);

    let embedded: Vec<Vec<EmbeddedChunk>> = stream::iter(batches)
        .map(|batch| {
            let progress = progress.clone();
            async move {
                let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
                let embeddings = client.embedding().embed_texts(texts).await?;
                if embeddings.len() != batch.len() {
                    return Err(ProcessError::EmbeddingProcessing(format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    )));
                }

                if let Some(progress) = progress {
                    // The receiver going away only means nobody is watching
                    let _ = progress.send(batch.len()).await;
                }

                Ok::<_, ProcessError>(
                    batch
                        .into_iter()
                        .zip(embeddings)
                        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
                        .collect::<Vec<_>>(),
                )
            }
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    Ok(embedded.into_iter().flatten().collect())
}
