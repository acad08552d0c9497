//! Ward Assistant CLI
//!
//! Main entry point for the `ward` command-line tool.
//! Runs the HTTP gateway and offers one-shot classification and retrieval.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ClassifyCommand, ServeCommand};
use std::path::PathBuf;
use ward_core::{config::AppConfig, logging, AppResult};

/// Ward Assistant - question routing and retrieval for ward services
#[derive(Parser, Debug)]
#[command(name = "ward")]
#[command(about = "Question routing and retrieval for ward administrative services", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./ward.yaml when present)
    #[arg(short, long, global = true, env = "WARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Document store backend (supabase, memory)
    #[arg(short, long, global = true, env = "WARD_STORE")]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve(ServeCommand),

    /// Show how a question is normalized and classified
    Classify(ClassifyCommand),

    /// Answer a question once against the document store
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration: defaults, file, environment
    let config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.store, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Ward Assistant CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Store: {}", config.store.backend);
    tracing::debug!("Embeddings: {}/{}", config.embedding.provider, config.embedding.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Classify(_) => "classify",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Classify(cmd) => cmd.execute(),
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
