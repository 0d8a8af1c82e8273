//! Interactive chat command.
//!
//! Reads one question per line from stdin until EOF or `/quit`.

use super::output::{print_ingest_report, print_response};
use super::IngestArgs;
use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::RagSession;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat with a set of documents
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub ingest: IngestArgs,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(documents = self.ingest.files.len(), "Executing chat command");

        let (session, report) = self.ingest.open_session(config).await?;
        print_ingest_report(&report);
        println!("Ask a question. Commands: /reset clears the conversation, /history shows it, /quit exits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match line.trim() {
                "" => continue,
                "/quit" | "/exit" => break,
                "/reset" => {
                    session.reset().await;
                    println!("Conversation cleared.");
                }
                "/history" => print_history(&session).await,
                question => match session.ask(question).await {
                    Ok(response) => {
                        print_response(&response);
                        println!();
                    }
                    // The session stays usable after a failed turn
                    Err(err @ (AppError::Embedding(_) | AppError::Synthesis(_))) => {
                        eprintln!("Error: {}", err);
                    }
                    Err(err) => return Err(err),
                },
            }
        }

        Ok(())
    }
}

async fn print_history(session: &RagSession) {
    let history = session.history().await;
    if history.is_empty() {
        println!("(no conversation yet)");
        return;
    }
    for turn in history {
        println!("Q: {}", turn.question);
        println!("A: {}", turn.answer);
    }
}
