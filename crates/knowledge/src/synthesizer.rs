//! Grounded answer synthesis.
//!
//! Renders the prompt template with retrieved passages, history and the
//! question, then asks the language model for an answer.

use crate::memory::ConversationMemory;
use crate::types::{AnsweredQuery, RetrievalResult};
use docchat_core::{AppError, AppResult};
use docchat_llm::{with_retry, LlmClient, LlmRequest, RetryPolicy};
use docchat_prompt::{PromptSlots, PromptTemplate, REFUSAL_SENTENCE};
use std::sync::Arc;
use std::time::Instant;

/// Sampling temperature used unless configured otherwise.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Composes answers from retrieved passages via the language model.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    template: PromptTemplate,
    condense_template: Option<PromptTemplate>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    retry: RetryPolicy,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, template: PromptTemplate, model: impl Into<String>) -> Self {
        Self {
            llm,
            template,
            condense_template: None,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub fn with_condense_template(mut self, template: Option<PromptTemplate>) -> Self {
        self.condense_template = template;
        self
    }

    pub fn condenses_questions(&self) -> bool {
        self.condense_template.is_some()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Render the answer prompt without calling the model.
    pub fn build_prompt(
        &self,
        question: &str,
        retrieved: &RetrievalResult,
        history: &ConversationMemory,
    ) -> AppResult<String> {
        let context = format_context(retrieved);
        let history = history.render();
        self.template.render(&PromptSlots {
            context: &context,
            question,
            history: &history,
        })
    }

    /// Answer `question` from `retrieved`, with `history` as prior context.
    ///
    /// When nothing was retrieved the fixed refusal is returned without a
    /// model call. Model failures become `AppError::Synthesis`.
    pub async fn answer(
        &self,
        question: &str,
        retrieved: RetrievalResult,
        history: &ConversationMemory,
    ) -> AppResult<AnsweredQuery> {
        if retrieved.is_empty() {
            tracing::info!(stage = "synthesize", "No passages retrieved, refusing");
            return Ok(AnsweredQuery {
                question: question.to_string(),
                answer: REFUSAL_SENTENCE.to_string(),
                sources: retrieved,
            });
        }

        let prompt = self.build_prompt(question, &retrieved, history)?;
        let answer = self.complete(prompt).await?;

        Ok(AnsweredQuery {
            question: question.to_string(),
            answer,
            sources: retrieved,
        })
    }

    /// Fold `history` and a follow-up `question` into a standalone question.
    ///
    /// Returns the question unchanged when condensing is disabled or there is
    /// no history yet.
    pub async fn condense(&self, question: &str, history: &ConversationMemory) -> AppResult<String> {
        let Some(template) = &self.condense_template else {
            return Ok(question.to_string());
        };
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let rendered_history = history.render();
        let prompt = template.render(&PromptSlots {
            question,
            history: &rendered_history,
            ..Default::default()
        })?;

        let standalone = self.complete(prompt).await?;
        tracing::debug!(standalone = %standalone, "Condensed follow-up question");
        Ok(standalone)
    }

    async fn complete(&self, prompt: String) -> AppResult<String> {
        let start = Instant::now();
        let mut request = LlmRequest::new(prompt, self.model.clone()).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let llm = self.llm.as_ref();
        let request = &request;
        let response = with_retry(self.retry, "answer synthesis", || llm.complete(request))
            .await
            .map_err(|e| AppError::Synthesis(e.to_string()))?;

        let answer = response.content.trim().to_string();
        if answer.is_empty() {
            return Err(AppError::Synthesis("language model returned an empty answer".to_string()));
        }

        tracing::info!(
            provider = self.llm.provider_name(),
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            elapsed_ms = start.elapsed().as_millis() as u64,
            stage = "synthesize",
            "Received answer"
        );

        Ok(answer)
    }
}

/// Concatenate retrieved passages, each headed by its source and page.
pub fn format_context(retrieved: &RetrievalResult) -> String {
    retrieved
        .iter()
        .map(|hit| {
            format!(
                "[{}, page {}]\n{}",
                hit.chunk.source_id, hit.chunk.page_number, hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
