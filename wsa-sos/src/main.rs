//! wsa-sos - Women Safety Assistant SOS service
//!
//! Startup order: configuration, logging, store client (verified with a
//! round trip), SMS notifier, query proxy, HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wsa_common::config::{resolve_config_path, ServiceConfig};
use wsa_common::store::{RestStore, SosRepository};
use wsa_sos::wolfram::WolframClient;
use wsa_sos::{build_router, notifier, AppState};

const DEFAULT_LOG_FILTER: &str = "wsa_sos=info,wsa_common=info,tower_http=info";

/// Command-line arguments for wsa-sos
#[derive(Parser, Debug)]
#[command(name = "wsa-sos")]
#[command(about = "SOS alert and notification service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "WSA_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and WSA_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is resolved before logging so the file can set the log level
    let config = ServiceConfig::load(args.config.as_deref());
    let log_filter = config
        .as_ref()
        .ok()
        .and_then(|c| c.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting WSA SOS service (wsa-sos) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using environment and defaults"),
    }

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    // Store client; an unreachable store at startup is fatal
    let store = RestStore::new(&config.store).context("Failed to create store client")?;
    info!("Store endpoint: {} (schema={})", store.base_url(), config.store.schema);
    let repo = SosRepository::new(Arc::new(store));
    repo.probe()
        .await
        .context("Store is not reachable")?;
    info!("✓ Connected to store");

    let notifier = notifier::from_config(config.twilio.as_ref())
        .context("Failed to create SMS notifier")?;

    let wolfram = WolframClient::new(config.wolfram_app_id.clone())
        .context("Failed to create Wolfram client")?;
    if !wolfram.is_configured() {
        info!("WOLFRAM_APP_ID not set; /api/wolfram will return errors");
    }

    let state = AppState::new(repo, notifier, wolfram);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("wsa-sos listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

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
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
