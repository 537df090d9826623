//! Juris CLI
//!
//! Main entry point for the juris command-line tool.
//! Conversational Q&A over a fixed set of legal documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, DocsCommand, PromptsCommand};
use juris_core::{
    config::AppConfig,
    logging::{self, LogFormat},
};
use std::path::PathBuf;

/// Juris - ask questions about Indian litigation and corporate compliance
#[derive(Parser, Debug)]
#[command(name = "juris")]
#[command(about = "Conversational legal Q&A over a fixed document set", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "JURIS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "JURIS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (text, json)
    #[arg(long, global = true, env = "JURIS_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "JURIS_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "JURIS_MODEL")]
    model: Option<String>,

    /// Gemini API key
    #[arg(long, global = true, env = "JURIS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive conversation over the legal documents
    Chat(ChatCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Inspect the loaded documents
    Docs(DocsCommand),

    /// Inspect the prompt templates
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Workspace and config file decide which YAML gets merged
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.api_key,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, cli.log_format)?;

    tracing::info!("Juris CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Chat(_) => "chat",
        Commands::Ask(_) => "ask",
        Commands::Docs(_) => "docs",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Docs(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
