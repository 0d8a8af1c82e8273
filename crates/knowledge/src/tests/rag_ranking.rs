//! Ranking behaviour of the flat index and the retriever cutoff.

use crate::retriever::Retriever;
use crate::types::Chunk;
use crate::vector_index::{FlatIndex, VectorIndex};
use crate::EmbeddingProvider;
use async_trait::async_trait;
use docchat_core::AppResult;
use std::sync::Arc;

fn chunk(position: usize, text: &str) -> Chunk {
    Chunk {
        text: text.to_string(),
        source_id: "notes.pdf".to_string(),
        page_number: position,
        sequence_index: position,
    }
}

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Embeds every text to the same fixed vector.
#[derive(Debug)]
struct FixedEmbedder(Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }
}

#[test]
fn test_relevant_query_returns_high_scores() {
    let index = FlatIndex::build(
        vec![
            chunk(0, "Rust is a systems programming language"),
            chunk(1, "Cooking recipes for pasta"),
        ],
        vec![
            normalize(&[1.0, 0.5, 0.2, 0.1]),
            normalize(&[-0.3, -0.8, 0.4, -0.2]),
        ],
    )
    .unwrap();

    let results = index.search(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.hits[0].chunk.sequence_index, 0, "Most relevant chunk should be first");
    assert!(results.hits[0].score > 0.8, "Relevant chunk score should be high: {}", results.hits[0].score);
    assert!(results.hits[0].score > results.hits[1].score);
}

#[test]
fn test_unrelated_chunks_still_returned_without_cutoff() {
    let index = FlatIndex::build(
        vec![chunk(0, "Rust programming language features")],
        vec![normalize(&[1.0, 0.0, 0.0, 0.0])],
    )
    .unwrap();

    let results = index.search(&normalize(&[0.0, 1.0, 0.0, 0.0]), 5).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.hits[0].score < 0.5, "Unrelated chunk score should be low: {}", results.hits[0].score);
}

#[test]
fn test_negative_similarity_ranks_last() {
    let index = FlatIndex::build(
        vec![
            chunk(0, "Text A"),
            chunk(1, "Text B"),
            chunk(2, "Text C"),
            chunk(3, "Text D"),
        ],
        vec![
            normalize(&[1.0, 0.0, 0.0]),
            normalize(&[0.7, 0.7, 0.0]),
            normalize(&[0.0, 1.0, 0.0]),
            normalize(&[-1.0, 0.0, 0.0]),
        ],
    )
    .unwrap();

    let results = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
    let order: Vec<_> = results.iter().map(|hit| hit.chunk.text.as_str()).collect();

    assert_eq!(order, vec!["Text A", "Text B", "Text C", "Text D"]);
    assert!(results.hits[0].score > 0.99, "Perfect match should have score near 1.0");
    assert!(results.hits[3].score < -0.99);
}

#[tokio::test]
async fn test_min_score_cutoff_applies_after_ranking() {
    let index = FlatIndex::build(
        vec![chunk(0, "close"), chunk(1, "middle"), chunk(2, "far")],
        vec![
            normalize(&[1.0, 0.1]),
            normalize(&[1.0, 1.0]),
            normalize(&[0.0, 1.0]),
        ],
    )
    .unwrap();

    let embedder = Arc::new(FixedEmbedder(vec![1.0, 0.0]));
    let retriever = Retriever::new(embedder, 3).with_min_score(Some(0.5));

    let results = retriever.retrieve(&index, "anything").await.unwrap();
    let order: Vec<_> = results.iter().map(|hit| hit.chunk.text.as_str()).collect();
    assert_eq!(order, vec!["close", "middle"]);
}
