//! Recursive character chunking with configurable size and overlap.
//!
//! Text is split on the first separator (paragraph, line, space, then single
//! characters) that occurs in it. Pieces shorter than `chunk_size` are merged
//! back into a sliding window; longer pieces are split again with the
//! remaining separators. Each separator stays attached to the start of the
//! piece that follows it, and every emitted chunk is whitespace-trimmed.
//!
//! Lengths are counted in Unicode scalar values, never bytes.

use crate::types::{Chunk, Page, SourceDocument};
use docchat_core::{AppError, AppResult};
use std::collections::VecDeque;

/// Separators tried in priority order; `""` means a hard character split.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Size and overlap limits for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters carried over between neighbouring chunks
    pub chunk_overlap: usize,

    pub separators: Vec<String>,
}

impl ChunkerConfig {
    /// Create a config, rejecting `chunk_size == 0` and `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Splits page text into overlapping, attributed chunks.
#[derive(Debug, Clone, Default)]
pub struct RecursiveCharacterSplitter {
    config: ChunkerConfig,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    /// Chunk one page, numbering chunks from `first_sequence_index`.
    pub fn chunk_page(&self, source_id: &str, page: &Page, first_sequence_index: usize) -> Vec<Chunk> {
        self.split_text(&page.text)
            .into_iter()
            .enumerate()
            .map(|(offset, text)| Chunk {
                text,
                source_id: source_id.to_string(),
                page_number: page.page_number,
                sequence_index: first_sequence_index + offset,
            })
            .collect()
    }

    /// Chunk every page of every document in order.
    ///
    /// Sequence indices are global across the batch, so they double as the
    /// insertion order of the vector index.
    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for document in documents {
            let before = chunks.len();
            for page in &document.pages {
                let page_chunks = self.chunk_page(&document.source_id, page, chunks.len());
                chunks.extend(page_chunks);
            }
            tracing::debug!(
                source_id = %document.source_id,
                chunk_count = chunks.len() - before,
                stage = "chunk",
                "Chunked document"
            );
        }

        tracing::debug!(
            chunk_count = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "Chunked documents"
        );

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; "" always matches.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            if remaining.is_empty() {
                // Single-character pieces at chunk_size 1 may be whitespace
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    final_chunks.push(trimmed.to_string());
                }
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Merge small pieces into windows of at most `chunk_size` characters,
    /// starting each new window with up to `chunk_overlap` characters of the
    /// previous one.
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);

            if total + len > size {
                if total > size {
                    tracing::warn!(total, chunk_size = size, "Created a chunk longer than chunk size");
                }
                if !window.is_empty() {
                    if let Some(doc) = join_window(&window) {
                        docs.push(doc);
                    }
                    while total > overlap || (total + len > size && total > 0) {
                        match window.pop_front() {
                            Some((_, dropped)) => total -= dropped,
                            None => break,
                        }
                    }
                }
            }

            window.push_back((split.as_str(), len));
            total += len;
        }

        if let Some(doc) = join_window(&window) {
            docs.push(doc);
        }

        docs
    }
}

/// Split on `separator`, re-attaching it to the start of each following
/// piece. Empty pieces are dropped; an empty separator yields characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }
    pieces
}

fn join_window(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
