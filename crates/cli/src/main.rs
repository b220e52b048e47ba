//! Reviewlens CLI
//!
//! Main entry point for the reviewlens command-line tool.
//! Answers business owners' questions from their customer reviews.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, EmbedCommand, PromptsCommand};
use reviewlens_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Reviewlens - ask questions about your customer reviews
#[derive(Parser, Debug)]
#[command(name = "reviewlens")]
#[command(about = "Answer questions about customer reviews with hybrid search and an LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "REVIEWLENS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "REVIEWLENS_CONFIG")]
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

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// LLM provider (azure, openai, ollama)
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
    /// Ask one question about the reviews
    Ask(AskCommand),

    /// Interactive session with login
    Chat(ChatCommand),

    /// Print the embedding of a text
    Embed(EmbedCommand),

    /// List or show prompt definitions
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, .env, config file, environment
    let mut config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.log_json |= cli.log_json;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Reviewlens CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Embed(_) => "embed",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Embed(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed during {}: {}", e.stage(), e),
    }

    result
}
