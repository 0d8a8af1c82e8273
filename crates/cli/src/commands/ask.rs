//! Ask command handler.
//!
//! Ingests the given documents and answers one or more questions in a
//! single session, so later questions see earlier answers as history.

use super::output::{print_ingest_report, print_response};
use super::IngestArgs;
use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};

/// Answer questions about a set of documents
#[derive(Args, Debug)]
pub struct AskCommand {
    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Question to ask; repeat for follow-up questions
    #[arg(short, long = "question", required = true)]
    pub questions: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            documents = self.ingest.files.len(),
            questions = self.questions.len(),
            "Executing ask command"
        );

        let (session, report) = self.ingest.open_session(config).await?;
        if !self.json {
            print_ingest_report(&report);
            println!();
        }

        let mut responses = Vec::with_capacity(self.questions.len());
        for question in &self.questions {
            let response = session.ask(question).await?;
            if !self.json {
                println!("Q: {}", response.question);
                print_response(&response);
                println!();
            }
            responses.push(response);
        }

        if self.json {
            let output = serde_json::json!({
                "ingest": report,
                "answers": responses,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        }

        Ok(())
    }
}
