//! `launchai serve` — run the HTTP API until Ctrl+C.
//!
//! Startup sequence:
//! 1. Load config, apply CLI host/port overrides
//! 2. Build the dispatcher (providers, prices, policy)
//! 3. Open the conversation store if storage is enabled
//! 4. Bind and serve the router with graceful shutdown

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use launchai_api::{create_routes, AppState};
use launchai_core::config::load_config;

use crate::{build_dispatcher, open_store};

pub async fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(None);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let dispatcher = Arc::new(build_dispatcher(&config)?);
    let provider_names: Vec<String> = dispatcher
        .provider_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut state = AppState::new(dispatcher);
    let storage = match open_store(&config) {
        Some(store) => {
            state = state.with_store(Arc::new(store), config.storage.max_history_turns);
            "enabled"
        }
        None => "disabled",
    };

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!();
    println!("  🚀 LaunchAI API on http://{addr}");
    println!("  Providers: {}", provider_names.join(" → "));
    println!("  Storage:   {storage}");
    println!();
    println!("  Ctrl+C to stop");
    println!();

    info!(addr = %addr, providers = ?provider_names, storage, "server starting");

    axum::serve(listener, create_routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    println!("  Server stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    println!();
    println!("  Shutting down...");
    info!("received Ctrl+C, shutting down");
}
