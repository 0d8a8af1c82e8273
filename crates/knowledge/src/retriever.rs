//! Question-to-passage retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::types::RetrievalResult;
use crate::vector_index::VectorIndex;
use docchat_core::AppResult;
use std::sync::Arc;
use std::time::Instant;

/// Default number of passages returned per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Embeds a question and looks up its nearest chunks.
#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            embedder,
            top_k,
            min_score: None,
        }
    }

    /// Drop hits scoring below `min_score`. `None` keeps all top-k hits.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn min_score(&self) -> Option<f32> {
        self.min_score
    }

    pub async fn retrieve(&self, index: &dyn VectorIndex, question: &str) -> AppResult<RetrievalResult> {
        let start = Instant::now();
        let query = self.embedder.embed(question).await?;
        let mut result = index.search(&query, self.top_k)?;

        if let Some(min_score) = self.min_score {
            let before = result.len();
            result.hits.retain(|hit| hit.score >= min_score);
            tracing::debug!(
                min_score,
                dropped = before - result.len(),
                "Applied similarity cutoff"
            );
        }

        tracing::info!(
            top_k = self.top_k,
            hits = result.len(),
            best_score = result.top().map(|hit| hit.score),
            elapsed_ms = start.elapsed().as_millis() as u64,
            stage = "retrieve",
            "Retrieved passages"
        );

        Ok(result)
    }
}
