//! Ollama embedding provider.
//!
//! Provides semantic embeddings via Ollama's local API using models like
//! `all-minilm` or `nomic-embed-text`. Transient failures are retried with
//! exponential backoff; dimension mismatches are reported, never padded.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docchat_core::{is_retryable_status, AppError, AppResult};
use docchat_llm::{with_retry, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Initial backoff between retries
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider; no request is made until the first embedding.
    pub fn new(
        endpoint: Option<&str>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
        max_retries: u32,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e)))?;

        Ok(Self {
            client,
            base_url: endpoint
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions,
            retry: RetryPolicy::new(max_retries, timeout).with_initial_backoff(INITIAL_BACKOFF),
        })
    }

    /// Embed one text with retries; timeouts surface as embedding errors.
    async fn embed_with_retries(&self, text: &str) -> AppResult<Vec<f32>> {
        let embedding = with_retry(self.retry, "ollama embedding", || self.embed_single(text))
            .await
            .map_err(|e| match e {
                AppError::Llm(message) => AppError::Embedding(message),
                rejected @ AppError::Rejected { .. } => AppError::Embedding(rejected.to_string()),
                other => other,
            })?;

        // Checked after retrying: a wrong model will not fix itself
        check_dimensions(&embedding, self.dimensions, &self.model)?;
        Ok(embedding)
    }

    /// Embed single text (no retries)
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);

            // Only rate limiting and server errors are worth another attempt
            if !is_retryable_status(status.as_u16()) {
                return Err(AppError::Rejected {
                    service: "Ollama".to_string(),
                    status: status.as_u16(),
                    message: detail,
                });
            }
            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(body.embedding)
    }
}

fn check_dimensions(embedding: &[f32], expected: usize, model: &str) -> AppResult<()> {
    if embedding.len() != expected {
        return Err(AppError::Embedding(format!(
            "Ollama model '{}' returned {} dimensions, expected {}",
            model,
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // The endpoint takes one prompt per request
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                return Err(AppError::Embedding("Cannot embed empty text".to_string()));
            }
            embeddings.push(self.embed_with_retries(text).await?);
        }

        debug!(count = embeddings.len(), "Embedded batch via Ollama");
        Ok(embeddings)
    }
}
