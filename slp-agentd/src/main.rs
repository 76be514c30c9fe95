mod agent;
mod api;
mod catalog;
mod config;
mod openslp;
mod services;
mod split;
mod worker;

use std::sync::Arc;
use anyhow::{Context, Result};
use shared::protocol::{API_PREFIX, COMPONENT_NAME, INIT_TERM};
use shared::value::{Term, Value};
use tokio_util::sync::CancellationToken;
use crate::agent::SlpAgent;
use crate::config::Config;
use crate::openslp::ffi::OpenSlp;
use crate::worker::AgentHandle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("slp_agentd=info"))
        )
        .init();

    tracing::info!("Starting slp-agentd ({})", COMPONENT_NAME);

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/slp-agent/agentd.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    // Bind the OpenSLP client library
    let library = OpenSlp::load(&config.agent.library)
        .with_context(|| format!("Failed to load {}", config.agent.library.display()))?;
    tracing::info!("Using OpenSLP library {}", config.agent.library.display());

    // Start agent thread and mount the agent
    let agent = AgentHandle::spawn(SlpAgent::new(library, config.agent.clone()));
    let mounted = agent
        .other_command(Term::new(INIT_TERM))
        .await
        .context("Failed to initialize agent")?;
    if mounted != Value::Void {
        anyhow::bail!("Agent rejected {}", INIT_TERM);
    }

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Build API router
    let app = api::routes::router(api::routes::AppState {
        agent: agent.clone(),
        regd_dir: Arc::new(config.regd.dir.clone()),
    });

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("API listening on http://{}{}", config.api.listen, API_PREFIX);

    // Run server with graceful shutdown
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    cancel.cancel();
    let _ = server_handle.await;

    // Shutdown agent thread
    if let Err(e) = agent.shutdown().await {
        tracing::error!("Failed to shutdown agent: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
