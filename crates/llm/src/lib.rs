//! Language-model integration for docchat.
//!
//! This crate provides a provider-agnostic abstraction for the language-model
//! service that composes answers. Providers sit behind a single trait so the
//! question-answering core never depends on a concrete vendor.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default, needs an API key)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use docchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2").with_temperature(0.1);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use retry::{with_retry, RetryPolicy};
pub use types::ProviderType;
