//! Command handlers for the docchat CLI.

pub mod ask;
pub mod chat;
mod output;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;

use clap::Args;
use docchat_core::{config::AppConfig, AppResult, LoadPolicy};
use docchat_knowledge::{IngestReport, RagSession};
use std::path::PathBuf;

/// Document and retrieval options shared by every command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Documents to chat with (.pdf, .txt)
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Skip documents that fail to load instead of aborting
    #[arg(long)]
    pub skip_unreadable: bool,

    /// Passages retrieved per question
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Minimum cosine similarity for a passage to be used
    #[arg(long)]
    pub min_score: Option<f32>,
}

impl IngestArgs {
    /// Build a session from `config` with these options applied, then ingest.
    pub async fn open_session(&self, config: &AppConfig) -> AppResult<(RagSession, IngestReport)> {
        let mut config = config.clone();
        if self.skip_unreadable {
            config.ingest.load_policy = LoadPolicy::SkipAndReport;
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if self.min_score.is_some() {
            config.retrieval.min_score = self.min_score;
        }

        let session = RagSession::from_config(&config)?;
        let report = session.ingest(&self.files).await?;
        Ok((session, report))
    }
}
