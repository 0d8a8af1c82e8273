//! Error types for docchat.
//!
//! This module defines a unified error enum covering every failure the
//! question-answering pipeline can surface: document loading, embedding,
//! answer synthesis, index state, plus the ambient configuration, I/O and
//! prompt errors.

use thiserror::Error;

/// Unified error type for docchat.
///
/// All functions in the workspace return `Result<T, AppError>`.
/// Errors carry enough context (source id, stage) to render a user-facing
/// message; nothing is swallowed silently.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source document could not be read or contained no extractable text
    #[error("Failed to load '{source_id}': {message}")]
    Load { source_id: String, message: String },

    /// The embedding service failed or returned malformed vectors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The language-model service failed while composing an answer
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Ingestion produced zero chunks
    #[error("No indexable text: the documents produced zero chunks")]
    EmptyIndex,

    /// A query was attempted before a successful ingestion
    #[error("No documents have been ingested yet; ingest documents before asking questions")]
    NotReady,

    /// Transport-level LLM provider errors (timeouts, connection failures,
    /// rate limiting, server errors)
    #[error("LLM error: {0}")]
    Llm(String),

    /// A remote service refused the request; sending it again will not help
    #[error("{service} rejected the request (HTTP {status}): {message}")]
    Rejected {
        service: String,
        status: u16,
        message: String,
    },

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid caller input (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Convenience constructor for load failures.
    pub fn load(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Load {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Pipeline stage the error belongs to, used as a structured log field.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Io(_) | AppError::Load { .. } => "load",
            AppError::Embedding(_) => "embed",
            AppError::EmptyIndex => "index",
            AppError::NotReady => "query",
            AppError::Synthesis(_) | AppError::Llm(_) => "synthesize",
            AppError::Rejected { .. } => "service",
            AppError::Prompt(_) => "prompt",
            AppError::InvalidInput(_) => "input",
            AppError::Serialization(_) => "serialize",
        }
    }

    /// Whether retrying the failed operation may succeed.
    ///
    /// Only service-boundary failures qualify; state and input errors are final,
    /// and so is a request the service has rejected.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::Embedding(_))
    }
}

/// Whether an unsuccessful HTTP status may clear up on retry.
///
/// Only rate limiting (429) and server errors (5xx) qualify.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
