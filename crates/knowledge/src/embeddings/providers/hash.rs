//! Offline embedding provider based on feature hashing.

use crate::embeddings::provider::EmbeddingProvider;
use docchat_core::AppResult;
use std::collections::{BTreeMap, HashSet};

const MODEL_NAME: &str = "feature-hash-v1";

/// Deterministic provider for tests and offline use.
///
/// Words and their character trigrams are hashed into a fixed number of
/// buckets and the result is L2-normalised. Vectors only capture lexical
/// overlap, not meaning, but they are stable across runs and platforms.
#[derive(Debug)]
pub struct HashProvider {
    dimensions: usize,
    stop_words: HashSet<&'static str>,
}

impl HashProvider {
    pub fn new(dimensions: usize) -> Self {
        let stop_words = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them", "what", "who", "how",
        ]
        .into_iter()
        .collect();

        Self {
            dimensions,
            stop_words,
        }
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        // FNV-1a: stable regardless of std's hasher
        let hash = feature.bytes().fold(0xcbf2_9ce4_8422_2325 ^ seed, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();

        // Ordered map keeps float accumulation order fixed
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !self.stop_words.contains(*w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 1)] += (*freq as f32).sqrt();
            }
            embedding[self.bucket(word, 0)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
