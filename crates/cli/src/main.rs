//! AppForge CLI, the main entry point.
//!
//! Commands:
//! - `run`     Run one agent request against a local file set
//! - `serve`   Start the HTTP gateway
//! - `tools`   List the tools offered to the model
//! - `config`  Show, locate, or validate the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "appforge",
    about = "AppForge, an AI agent that builds web apps in a virtual file store",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single agent request
    Run {
        /// What to build or change
        #[arg(short, long)]
        message: String,

        /// JSON object of path -> content to start from
        #[arg(short, long)]
        files: Option<PathBuf>,

        /// "openai" or "anthropic"
        #[arg(short, long)]
        provider: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Write the final file set here as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// User id for quota accounting
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools offered to the model
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API keys redacted)
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration and report missing keys
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            message,
            files,
            provider,
            model,
            out,
            user,
        } => {
            commands::run::run(commands::run::RunArgs {
                message,
                files,
                provider,
                model,
                out,
                user,
            })
            .await?
        }
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
