//! PromptForge CLI — the main entry point.
//!
//! Commands:
//! - `estimate` — Token and cost estimate for a prompt
//! - `parse`    — Structure a raw LLM reply as JSON
//! - `compose`  — Compose a layer file into a prompt
//! - `pricing`  — Show the rate table
//! - `config`   — Create or show the configuration
//! - `sessions` — Inspect saved sessions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "promptforge",
    about = "PromptForge — prompt composition and response structuring",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of ~/.promptforge/config.toml
    #[arg(short, long, global = true, env = "PROMPTFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate tokens and cost for a prompt (reads stdin without FILE)
    Estimate {
        file: Option<PathBuf>,

        /// Provider to price against (defaults to the configured one)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to price against (defaults to the configured one)
        #[arg(short, long)]
        model: Option<String>,

        /// Expected reply size; defaults to the prompt's own estimate
        #[arg(short, long)]
        output_tokens: Option<usize>,
    },

    /// Parse a raw reply into explanation and code blocks (reads stdin without FILE)
    Parse {
        file: Option<PathBuf>,

        #[arg(short, long)]
        provider: Option<String>,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Compose the layers in a TOML file and print the prompt
    Compose {
        layers: PathBuf,

        /// Drop lower-priority layers to fit this many tokens
        #[arg(short, long)]
        budget: Option<usize>,
    },

    /// Show the model rate table
    Pricing,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect saved sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List sessions, most recently updated first
    List,
    /// Show a session's iterations
    Show { id: String },
    /// Diff the code of two iterations
    Diff {
        id: String,
        from: usize,
        to: usize,
        /// Diff every shared language instead of the first one
        #[arg(long)]
        all: bool,
    },
    /// Delete a session
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Estimate {
            file,
            provider,
            model,
            output_tokens,
        } => {
            commands::estimate::run(
                config_path,
                file.as_deref(),
                provider,
                model,
                output_tokens,
            )
            .await?
        }
        Commands::Parse {
            file,
            provider,
            model,
        } => commands::parse::run(config_path, file.as_deref(), provider, model).await?,
        Commands::Compose { layers, budget } => {
            commands::compose::run(config_path, &layers, budget).await?
        }
        Commands::Pricing => commands::estimate::pricing(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(config_path).await?,
            SessionsAction::Show { id } => commands::sessions::show(config_path, &id).await?,
            SessionsAction::Diff { id, from, to, all } => {
                commands::sessions::diff(config_path, &id, from, to, all).await?
            }
            SessionsAction::Delete { id } => commands::sessions::delete(config_path, &id).await?,
        },
    }

    Ok(())
}
