//! Shared fixtures for session tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docchat_core::{AppConfig, AppError, AppResult};
use docchat_knowledge::embeddings::providers::HashProvider;
use docchat_knowledge::{EmbeddingProvider, RagSession};
use docchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

pub const DIMENSIONS: usize = 384;

/// Language model double that replays scripted replies and records prompts.
///
/// Once the script runs out it answers with a fixed string.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(AppError::Llm(message.to_string())));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Scripted answer.".to_string()))?;

        Ok(LlmResponse {
            content: reply,
            model: request.model.clone(),
            usage: LlmUsage::new(1, 1),
        })
    }
}

/// Small chunks and no retries, so failures surface immediately.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.retrieval.chunk_size = 100;
    config.retrieval.chunk_overlap = 20;
    config.llm.max_retries = 0;
    config.embedding.provider = "hash".to_string();
    config.embedding.dimensions = DIMENSIONS;
    config
}

pub fn session_with(llm: Arc<ScriptedLlm>, config: &AppConfig) -> RagSession {
    RagSession::new(Arc::new(HashProvider::new(DIMENSIONS)), llm, config).unwrap()
}

pub fn session_with_services(
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    config: &AppConfig,
) -> RagSession {
    RagSession::new(embedder, llm, config).unwrap()
}

/// Holds callers back until opened. Starts closed.
#[derive(Debug)]
pub struct Gate {
    permits: Semaphore,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            permits: Semaphore::new(0),
        })
    }

    pub fn open(&self) {
        // The single permit is handed back after every pass
        self.permits.add_permits(1);
    }

    pub async fn pass(&self) {
        let _permit = self.permits.acquire().await.unwrap();
    }
}

/// Hash embedder that waits at a gate before every batch.
#[derive(Debug)]
pub struct GatedEmbedder {
    inner: HashProvider,
    pub gate: Arc<Gate>,
}

impl GatedEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashProvider::new(DIMENSIONS),
            gate: Gate::closed(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    fn provider_name(&self) -> &str {
        "gated"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.gate.pass().await;
        self.inner.embed_batch(texts).await
    }
}

/// Scripted model that counts callers and holds them at a gate.
pub struct GatedLlm {
    inner: Arc<ScriptedLlm>,
    pub gate: Arc<Gate>,
    entered: AtomicUsize,
}

impl GatedLlm {
    pub fn new(inner: Arc<ScriptedLlm>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: Gate::closed(),
            entered: AtomicUsize::new(0),
        })
    }

    /// Number of calls that have reached the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for GatedLlm {
    fn provider_name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.inner.complete(request).await
    }
}

/// Poll `condition` until it holds, failing the test after about five seconds.
pub async fn wait_until<F, Fut>(what: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

/// Write a plain-text document whose pages are separated by form feeds.
pub fn write_document(dir: &TempDir, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, pages.join("\x0C")).unwrap();
    path
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
