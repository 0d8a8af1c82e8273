//! docchat CLI
//!
//! Main entry point for the docchat command-line tool.
//! Ingests PDF and text documents and answers questions about them with
//! cited sources.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand};
use docchat_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// docchat - chat with your documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Ask questions about PDF and text documents, with cited sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./docchat.yaml when present)
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer questions about documents
    Ask(AskCommand),

    /// Interactive chat over documents
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(
            cli.provider,
            cli.model,
            cli.log_level,
            cli.verbose,
            cli.no_color,
        );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docchat starting");
    tracing::debug!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        embedding_provider = %config.embedding.provider,
        "Resolved configuration"
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(stage = e.stage(), "Command failed: {}", e),
    }

    result.with_context(|| format!("docchat {} failed", command_name))
}
