//! Concrete LLM provider clients.

mod gemini;
mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

#[cfg(test)]
pub(crate) mod stub_server;

use docchat_core::{is_retryable_status, AppError};

/// Read an unsuccessful HTTP response into an error.
///
/// Rate limiting and server errors become a retryable `AppError::Llm`; any
/// other status is a permanent `AppError::Rejected`.
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if is_retryable_status(status.as_u16()) {
        AppError::Llm(format!("{} API error ({}): {}", provider, status, error_text))
    } else {
        AppError::Rejected {
            service: provider.to_string(),
            status: status.as_u16(),
            message: error_text,
        }
    }
}
