//! Vector index abstraction for knowledge chunks.
//!
//! The index is built once per ingestion and is read-only afterwards; a new
//! ingestion replaces it wholesale rather than mutating it.

use crate::types::{Chunk, RetrievalResult, ScoredChunk};
use docchat_core::{AppError, AppResult};

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` chunks by descending similarity to `query`.
    ///
    /// Equal scores keep insertion order.
    fn search(&self, query: &[f32], top_k: usize) -> AppResult<RetrievalResult>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality shared by every stored vector.
    fn dimensions(&self) -> usize;
}

#[derive(Debug)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

/// Exhaustive in-memory cosine-similarity index.
#[derive(Debug)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl FlatIndex {
    /// Build an index from parallel chunk and vector sequences.
    ///
    /// # Errors
    /// - `AppError::EmptyIndex` when `chunks` is empty
    /// - `AppError::Embedding` on a length mismatch, inconsistent or zero
    ///   dimensionality, or non-finite vector components
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        if chunks.is_empty() {
            return Err(AppError::EmptyIndex);
        }
        if chunks.len() != vectors.len() {
            return Err(AppError::Embedding(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors[0].len();
        if dimensions == 0 {
            return Err(AppError::Embedding("vectors have zero dimensions".to_string()));
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for (position, (chunk, vector)) in chunks.into_iter().zip(vectors).enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "vector {} has {} dimensions, index has {}",
                    position,
                    vector.len(),
                    dimensions
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(AppError::Embedding(format!(
                    "vector {} contains non-finite values",
                    position
                )));
            }
            let norm = l2_norm(&vector);
            entries.push(IndexEntry {
                chunk,
                vector,
                norm,
            });
        }

        tracing::debug!(chunk_count = entries.len(), dimensions, stage = "index", "Built vector index");

        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Query the index; alias of [`VectorIndex::search`].
    pub fn query(&self, query: &[f32], top_k: usize) -> AppResult<RetrievalResult> {
        self.search(query, top_k)
    }

    /// Indexed chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], top_k: usize) -> AppResult<RetrievalResult> {
        if query.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "query vector has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }
        if top_k == 0 {
            return Ok(RetrievalResult::default());
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let score = if query_norm == 0.0 || entry.norm == 0.0 {
                    0.0
                } else {
                    dot(query, &entry.vector) / (query_norm * entry.norm)
                };
                (position, score)
            })
            .collect();

        // Stable sort: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        let hits = scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect();

        Ok(RetrievalResult::new(hits))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Cosine similarity; 0.0 when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot(a, b) / denom
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(i: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_id: "doc.pdf".to_string(),
            page_number: i,
            sequence_index: i,
        }
    }

    #[test]
    fn test_build_rejects_empty() {
        assert!(matches!(
            FlatIndex::build(vec![], vec![]),
            Err(AppError::EmptyIndex)
        ));
    }

    #[test]
    fn test_build_rejects_length_mismatch() {
        let result = FlatIndex::build(vec![chunk(0, "a")], vec![vec![1.0], vec![0.5]]);
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[test]
    fn test_build_rejects_inconsistent_dimensions() {
        let result = FlatIndex::build(
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(result.unwrap_err().to_string().contains("dimensions"));
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = FlatIndex::build(
            vec![chunk(0, "x-axis"), chunk(1, "diagonal"), chunk(2, "y-axis")],
            vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0]],
        )
        .unwrap();

        let result = index.query(&[0.0, 2.0], 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].chunk.text, "y-axis");
        assert!((result.hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(result.hits[1].chunk.text, "diagonal");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = FlatIndex::build(
            vec![chunk(0, "first"), chunk(1, "second"), chunk(2, "third")],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap();

        let result = index.query(&[1.0, 0.0], 5).unwrap();
        let order: Vec<_> = result.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = FlatIndex::build(vec![chunk(0, "a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(index.query(&[1.0], 1).is_err());
    }

    #[test]
    fn test_zero_k_and_zero_query() {
        let index = FlatIndex::build(vec![chunk(0, "a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(index.query(&[0.0, 0.0], 1).unwrap().hits[0].score, 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_query_sorted_and_bounded(
            vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..40),
            query in prop::collection::vec(-1.0f32..1.0, 4),
            k in 0usize..50,
        ) {
            let chunks: Vec<Chunk> = (0..vectors.len()).map(|i| chunk(i, "t")).collect();
            let index = FlatIndex::build(chunks, vectors.clone()).unwrap();
            let result = index.query(&query, k).unwrap();

            prop_assert!(result.len() <= k);
            prop_assert_eq!(result.len(), k.min(vectors.len()));
            for pair in result.hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].chunk.sequence_index < pair[1].chunk.sequence_index);
                }
            }
        }
    }
}
