//! Question-answering session over a set of ingested documents.
//!
//! A [`RagSession`] owns one index and one conversation. It moves through
//! `Empty -> Ingesting -> Ready`; a failed ingestion drops back to `Empty`
//! and a re-ingestion replaces the index and clears the conversation.
//!
//! Queries take an `Arc` snapshot of the index, so a query that started
//! before a re-ingestion finishes against the index it started with. Its
//! turn is not recorded into the new conversation.

use crate::chunker::{ChunkerConfig, RecursiveCharacterSplitter};
use crate::embeddings::{create_provider, embed_chunks, EmbeddingProvider};
use crate::loader::load_all;
use crate::memory::ConversationMemory;
use crate::retriever::Retriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{ConversationTurn, IngestReport, QueryResponse, SessionState};
use crate::vector_index::{FlatIndex, VectorIndex};
use docchat_core::config::AppConfig;
use docchat_core::{AppError, AppResult, LoadPolicy};
use docchat_llm::{create_client, LlmClient, RetryPolicy};
use docchat_prompt::{load_template, PromptTemplate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    index: Option<Arc<FlatIndex>>,

    /// Bumped on every ingestion; queries from an older generation are not recorded
    generation: u64,
    memory: ConversationMemory,
    transcript: Vec<QueryResponse>,
}

/// An explicitly constructed chat-with-documents session.
pub struct RagSession {
    splitter: RecursiveCharacterSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    load_policy: LoadPolicy,
    batch_size: usize,
    concurrency: usize,
    inner: RwLock<SessionInner>,
    ingest_guard: Mutex<()>,
}

impl RagSession {
    /// Build a session around the given services.
    ///
    /// Settings are taken from `config` as-is; call [`AppConfig::validate`]
    /// first when the config comes from user input.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let splitter = RecursiveCharacterSplitter::new(ChunkerConfig::new(
            config.retrieval.chunk_size,
            config.retrieval.chunk_overlap,
        )?);

        let retriever = Retriever::new(embedder.clone(), config.retrieval.top_k)
            .with_min_score(config.retrieval.min_score);

        let template = match &config.prompt.template_file {
            Some(path) => load_template(path)?,
            None => PromptTemplate::answer_default()?,
        };
        let condense_template = if config.prompt.condense_questions {
            Some(PromptTemplate::condense_default()?)
        } else {
            None
        };

        let retry = RetryPolicy::new(
            config.llm.max_retries,
            Duration::from_secs(config.llm.timeout_secs),
        );
        let synthesizer = AnswerSynthesizer::new(llm, template, config.llm.model.clone())
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens)
            .with_retry_policy(retry)
            .with_condense_template(condense_template);

        Ok(Self {
            splitter,
            embedder,
            retriever,
            synthesizer,
            load_policy: config.ingest.load_policy,
            batch_size: config.embedding.batch_size,
            concurrency: config.embedding.concurrency,
            inner: RwLock::new(SessionInner {
                state: SessionState::Empty,
                index: None,
                generation: 0,
                memory: ConversationMemory::new(config.memory.max_turns),
                transcript: Vec::new(),
            }),
            ingest_guard: Mutex::new(()),
        })
    }

    /// Validate `config` and connect to the configured services.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let api_key = config.resolve_api_key();
        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        let embedder = create_provider(&config.embedding)?;

        tracing::info!(
            llm_provider = llm.provider_name(),
            llm_model = %config.llm.model,
            embedding_provider = embedder.provider_name(),
            embedding_model = embedder.model_name(),
            "Created session"
        );

        Self::new(embedder, llm, config)
    }

    /// Replace the index with one built from `paths`.
    ///
    /// Conversation history is cleared before anything is loaded. On
    /// failure the session is left `Empty` with no index.
    pub async fn ingest(&self, paths: &[PathBuf]) -> AppResult<IngestReport> {
        let _guard = self.ingest_guard.lock().await;
        let start = Instant::now();

        {
            let mut inner = self.inner.write().await;
            inner.state = SessionState::Ingesting;
            inner.index = None;
            inner.generation += 1;
            inner.memory.clear();
            inner.transcript.clear();
        }

        tracing::info!(documents = paths.len(), stage = "ingest", "Starting ingestion");

        match self.build_index(paths).await {
            Ok((index, mut report)) => {
                report.elapsed_ms = start.elapsed().as_millis() as u64;

                let mut inner = self.inner.write().await;
                inner.index = Some(Arc::new(index));
                inner.state = SessionState::Ready;

                tracing::info!(
                    documents = report.documents.len(),
                    pages = report.pages,
                    chunks = report.chunks,
                    skipped = report.skipped.len(),
                    elapsed_ms = report.elapsed_ms,
                    stage = "ingest",
                    "Ingestion complete"
                );
                Ok(report)
            }
            Err(err) => {
                self.inner.write().await.state = SessionState::Empty;
                tracing::warn!(stage = err.stage(), error = %err, "Ingestion failed");
                Err(err)
            }
        }
    }

    async fn build_index(&self, paths: &[PathBuf]) -> AppResult<(FlatIndex, IngestReport)> {
        let owned = paths.to_vec();
        let policy = self.load_policy;
        let outcome = tokio::task::spawn_blocking(move || load_all(&owned, policy))
            .await
            .map_err(|e| AppError::Io(std::io::Error::other(e)))??;

        let chunks = self.splitter.chunk_documents(&outcome.documents);
        if chunks.is_empty() {
            return Err(AppError::EmptyIndex);
        }

        let vectors = embed_chunks(
            self.embedder.as_ref(),
            &chunks,
            self.batch_size,
            self.concurrency,
        )
        .await?;

        let report = IngestReport {
            documents: outcome
                .documents
                .iter()
                .map(|doc| doc.source_id.clone())
                .collect(),
            pages: outcome.documents.iter().map(|doc| doc.pages.len()).sum(),
            chunks: chunks.len(),
            dimensions: self.embedder.dimensions(),
            skipped: outcome.skipped,
            elapsed_ms: 0,
        };

        let index = FlatIndex::build(chunks, vectors)?;
        Ok((index, report))
    }

    /// Answer `question` from the current index and conversation.
    ///
    /// # Errors
    /// - `AppError::InvalidInput` for a blank question
    /// - `AppError::NotReady` unless the session is `Ready`
    /// - `AppError::Embedding` / `AppError::Synthesis` from the services;
    ///   the conversation is left unchanged
    pub async fn ask(&self, question: &str) -> AppResult<QueryResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("question must not be empty".to_string()));
        }

        let (index, memory, generation) = {
            let inner = self.inner.read().await;
            match (inner.state, &inner.index) {
                (SessionState::Ready, Some(index)) => {
                    (index.clone(), inner.memory.clone(), inner.generation)
                }
                _ => return Err(AppError::NotReady),
            }
        };

        let response = self
            .answer_with(index.as_ref(), &memory, question)
            .await
            .inspect_err(|err| {
                tracing::warn!(stage = err.stage(), error = %err, "Query failed");
            })?;

        let mut inner = self.inner.write().await;
        if inner.generation == generation {
            inner
                .memory
                .append(ConversationTurn::new(question, response.answer.clone()));
            inner.transcript.push(response.clone());
        } else {
            tracing::debug!("Session was re-ingested during the query; turn not recorded");
        }

        Ok(response)
    }

    async fn answer_with(
        &self,
        index: &dyn VectorIndex,
        memory: &ConversationMemory,
        question: &str,
    ) -> AppResult<QueryResponse> {
        let standalone = if self.synthesizer.condenses_questions() && !memory.is_empty() {
            Some(self.synthesizer.condense(question, memory).await?)
        } else {
            None
        };

        // A condensed question already folds in the history
        let no_history = ConversationMemory::unbounded();
        let (prompt_question, history) = match &standalone {
            Some(standalone) => (standalone.as_str(), &no_history),
            None => (question, memory),
        };

        let retrieved = self.retriever.retrieve(index, prompt_question).await?;
        let answered = self
            .synthesizer
            .answer(prompt_question, retrieved, history)
            .await?;

        Ok(QueryResponse {
            question: question.to_string(),
            sources: answered.source_refs(),
            answer: answered.answer,
            standalone_question: standalone,
        })
    }

    /// Clear the conversation, keeping the index.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.memory.clear();
        inner.transcript.clear();
        tracing::debug!("Conversation reset");
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    /// Turns currently kept for prompt context, oldest first.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.inner.read().await.memory.as_context()
    }

    /// Every answered query since the last ingestion or reset.
    pub async fn transcript(&self) -> Vec<QueryResponse> {
        self.inner.read().await.transcript.clone()
    }

    /// Number of chunks in the current index.
    pub async fn chunk_count(&self) -> usize {
        self.inner
            .read()
            .await
            .index
            .as_ref()
            .map_or(0, |index| index.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashProvider;
    use docchat_llm::{LlmRequest, LlmResponse, LlmUsage};
    use std::io::Write;

    struct EchoLlm;

    #[async_trait::async_trait]
    impl LlmClient for EchoLlm {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: format!("{} chars of prompt", request.prompt.len()),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn session(config: &AppConfig) -> RagSession {
        RagSession::new(Arc::new(HashProvider::new(64)), Arc::new(EchoLlm), config).unwrap()
    }

    fn text_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let session = session(&AppConfig::default());
        assert_eq!(session.state().await, SessionState::Empty);
        assert!(matches!(session.ask("hi").await, Err(AppError::NotReady)));
    }

    #[tokio::test]
    async fn test_blank_question_rejected_before_state_check() {
        let session = session(&AppConfig::default());
        assert!(matches!(
            session.ask("   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_then_ask_records_turn() {
        let session = session(&AppConfig::default());
        let file = text_file("Alpha page.\x0CBeta page.");

        let report = session.ingest(&[file.path().to_path_buf()]).await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.dimensions, 64);
        assert_eq!(session.state().await, SessionState::Ready);
        assert_eq!(session.chunk_count().await, 2);

        let response = session.ask("  alpha?  ").await.unwrap();
        assert_eq!(response.question, "alpha?");
        assert_eq!(session.history().await.len(), 1);
        assert_eq!(session.transcript().await.len(), 1);

        session.reset().await;
        assert!(session.history().await.is_empty());
        assert_eq!(session.state().await, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_bad_template_file_fails_construction() {
        let mut config = AppConfig::default();
        config.prompt.template_file = Some(PathBuf::from("/nonexistent/prompt.yaml"));

        let result = RagSession::new(Arc::new(HashProvider::new(8)), Arc::new(EchoLlm), &config);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_leaves_session_empty() {
        let session = session(&AppConfig::default());
        let result = session
            .ingest(&[PathBuf::from("/nonexistent/missing.txt")])
            .await;

        assert!(matches!(result, Err(AppError::Load { .. })));
        assert_eq!(session.state().await, SessionState::Empty);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_session_futures_are_send() {
        let session = session(&AppConfig::default());
        let paths = vec![PathBuf::from("unused.txt")];

        // Checked without polling; spawning on a multi-threaded runtime needs this
        let ingest = session.ingest(&paths);
        assert_send(&ingest);
        let ask = session.ask("unused");
        assert_send(&ask);
    }
}
