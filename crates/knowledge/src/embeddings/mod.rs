//! Embedding engine for ingested chunks.
//!
//! Providers sit behind [`EmbeddingProvider`]; [`embed_chunks`] fans batches
//! out concurrently while keeping vectors in chunk order.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use crate::types::Chunk;
use docchat_core::{AppError, AppResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Instant;

/// Embed `chunks` in batches of `batch_size`, running up to `concurrency`
/// batches at once.
///
/// The returned vectors line up 1:1 with `chunks` regardless of which batch
/// finishes first. Any provider failure aborts the whole call; there is no
/// fallback to empty vectors.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    batch_size: usize,
    concurrency: usize,
) -> AppResult<Vec<Vec<f32>>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    // Owned batches keep the stream future `Send`
    let batches: Vec<Vec<String>> = texts.chunks(batch_size.max(1)).map(<[String]>::to_vec).collect();
    let batch_count = batches.len();

    tracing::info!(
        chunk_count = chunks.len(),
        batch_count,
        concurrency,
        provider = provider.provider_name(),
        model = provider.model_name(),
        stage = "embed",
        "Embedding chunks"
    );

    // `buffered` yields results in submission order
    let per_batch: Vec<Vec<Vec<f32>>> = stream::iter(batches)
        .map(|batch| async move {
            let vectors = provider.embed_batch(&batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            Ok(vectors)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let vectors: Vec<Vec<f32>> = per_batch.into_iter().flatten().collect();

    let expected = provider.dimensions();
    if let Some((position, vector)) = vectors
        .iter()
        .enumerate()
        .find(|(_, v)| v.len() != expected)
    {
        return Err(AppError::Embedding(format!(
            "vector for chunk {} has {} dimensions, expected {}",
            position,
            vector.len(),
            expected
        )));
    }

    tracing::debug!(
        chunk_count = vectors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedded chunks"
    );

    Ok(vectors)
}
