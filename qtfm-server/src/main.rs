//! qtfm-server - QingTing FM directory proxy and stream URL signer
//!
//! Serves the station directory as JSON and hands out signed, expiring
//! stream URLs. Configuration priority: command-line flags, environment
//! variables, TOML file, built-in defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qtfm_common::config::TomlConfig;
use qtfm_server::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for qtfm-server
#[derive(Parser, Debug)]
#[command(name = "qtfm-server")]
#[command(about = "QingTing FM station directory proxy and stream URL signer")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "QTFM_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides the config file)
    #[arg(long, env = "QTFM_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "QTFM_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "qtfm_server={level},qtfm_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting qtfm-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config.source {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => warn!("No configuration file found, using built-in defaults"),
    }
    info!("Upstream directory: {}", config.upstream.endpoint);
    if let Some(page) = &config.server.index_html {
        info!("Index page: {}", page.display());
    }

    let state = AppState::from_config(&config).context("Failed to initialize application state")?;
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("qtfm-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
