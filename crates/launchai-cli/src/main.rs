//! LaunchAI CLI — entry point.
//!
//! # Commands
//!
//! - `launchai serve [--host H] [--port P]` — run the HTTP API
//! - `launchai ask MESSAGE [--profile FILE]` — one-shot question
//! - `launchai chat [--profile FILE] [--conversation ID]` — interactive REPL
//! - `launchai status` — configuration and provider status
//! - `launchai conversations list|show|delete` — stored conversations
//! - `launchai onboard` — write a starter config

mod conversations_cmd;
mod helpers;
mod onboard;
mod repl;
mod serve;
mod status;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use launchai_core::config::{load_config, Config};
use launchai_core::conversation::ConversationStore;
use launchai_core::types::{BusinessContext, DispatchRequest, DispatchResult};
use launchai_core::utils::expand_home;
use launchai_dispatch::Dispatcher;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// LaunchAI — marketing strategy assistant backed by multiple AI providers
#[derive(Parser)]
#[command(name = "launchai", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        message: String,

        /// JSON file with the business profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat interactively
    Chat {
        /// JSON file with the business profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Resume a stored conversation
        #[arg(short, long)]
        conversation: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Inspect stored conversations
    Conversations {
        #[command(subcommand)]
        action: conversations_cmd::ConversationsCommands,
    },

    /// Write a starter configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, logs } => {
            init_logging(logs);
            serve::run(host, port).await
        }
        Commands::Ask {
            message,
            profile,
            logs,
        } => {
            init_logging(logs);
            run_ask(message, profile.as_deref()).await
        }
        Commands::Chat {
            profile,
            conversation,
            logs,
        } => {
            init_logging(logs);
            let config = load_config(None);
            let dispatcher = build_dispatcher(&config)?;
            let context = load_profile(profile.as_deref())?;
            let store = open_store(&config);
            repl::run(
                dispatcher,
                context,
                store,
                conversation,
                config.storage.max_history_turns,
            )
            .await
        }
        Commands::Status => status::run(),
        Commands::Conversations { action } => conversations_cmd::dispatch(action),
        Commands::Onboard => onboard::run(),
    }
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(message: String, profile: Option<&Path>) -> Result<()> {
    if message.trim().is_empty() {
        bail!("message must not be empty");
    }

    let config = load_config(None);
    let dispatcher = build_dispatcher(&config)?;

    let mut request = DispatchRequest::new(message);
    if let Some(context) = load_profile(profile)? {
        request = request.with_context(context);
    }

    match dispatcher.generate(&request).await {
        DispatchResult::Success {
            text,
            provider,
            model,
            usage,
        } => {
            helpers::print_response(&text);
            helpers::print_usage(&provider, &model, &usage);
            Ok(())
        }
        DispatchResult::Failure { error_summary, .. } => bail!(error_summary),
    }
}

// ─────────────────────────────────────────────
// Shared setup
// ─────────────────────────────────────────────

/// Build the dispatcher from the loaded configuration.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let dispatcher = Dispatcher::from_config(config).context("failed to build providers")?;

    if !dispatcher.has_configured_provider() {
        warn!("no provider has an API key; every request will fail until one is configured");
    }
    info!(providers = ?dispatcher.provider_names(), "dispatcher ready");

    Ok(dispatcher)
}

/// Open the conversation store, or `None` when storage is disabled or unavailable.
pub fn open_store(config: &Config) -> Option<ConversationStore> {
    if !config.storage.enabled {
        return None;
    }
    let dir = config.storage.conversations_dir.as_deref().map(expand_home);
    match ConversationStore::new(dir) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "conversation storage unavailable, continuing without it");
            None
        }
    }
}

/// Read a business profile from a JSON file.
pub fn load_profile(path: Option<&Path>) -> Result<Option<BusinessContext>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let context: BusinessContext = serde_json::from_str(&content)
        .with_context(|| format!("invalid profile JSON in {}", path.display()))?;
    Ok(Some(context).filter(|c| !c.is_empty()))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("launchai=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
