//! Chat with your documents.
//!
//! Loads paginated documents, splits them into overlapping chunks, embeds
//! the chunks into an in-memory vector index and answers questions from the
//! most similar passages, citing source and page.
//!
//! # Example
//! ```no_run
//! use docchat_core::AppConfig;
//! use docchat_knowledge::RagSession;
//! use std::path::PathBuf;
//!
//! # async fn example() -> docchat_core::AppResult<()> {
//! let session = RagSession::from_config(&AppConfig::load(None)?)?;
//! session.ingest(&[PathBuf::from("handbook.pdf")]).await?;
//!
//! let response = session.ask("What is the refund policy?").await?;
//! println!("{}", response.answer);
//! for source in &response.sources {
//!     println!("  {} p.{}", source.source_id, source.page_number);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod memory;
pub mod retriever;
pub mod session;
pub mod synthesizer;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{ChunkerConfig, RecursiveCharacterSplitter};
pub use embeddings::{create_provider, embed_chunks, EmbeddingProvider};
pub use loader::{load_all, load_document, LoadOutcome};
pub use memory::ConversationMemory;
pub use retriever::Retriever;
pub use session::RagSession;
pub use synthesizer::{format_context, AnswerSynthesizer};
pub use types::{
    AnsweredQuery, Chunk, ConversationTurn, IngestReport, Page, QueryResponse, RetrievalResult,
    ScoredChunk, SessionState, SkippedDocument, SourceDocument, SourceRef,
};
pub use vector_index::{FlatIndex, VectorIndex};
