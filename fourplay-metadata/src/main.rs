//! fourplay-metadata - Music Metadata Aggregation microservice
//!
//! Aggregates recording identity (MusicBrainz), artist similarity
//! (ListenBrainz), catalog depth (Discogs) and track popularity (Last.fm)
//! into one scored bundle per artist/title query.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fourplay_common::config::{load_config, Credentials};
use fourplay_metadata::cache::spawn_cache_sweeper;
use fourplay_metadata::{build_router, AppState};

/// Command-line arguments for fourplay-metadata
#[derive(Parser, Debug)]
#[command(name = "fourplay-metadata")]
#[command(about = "Music metadata aggregation microservice for FOURplay")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides TOML)
    #[arg(short, long, env = "FOURPLAY_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides TOML)
    #[arg(long, env = "FOURPLAY_HOST")]
    host: Option<String>,

    /// Path to the TOML bootstrap config
    #[arg(short, long, env = "FOURPLAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    // RUST_LOG wins over the TOML level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting FOURplay Metadata (fourplay-metadata) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        cache_ttl_secs = config.cache.ttl_secs,
        max_attempts = config.fetch.max_attempts,
        attempt_timeout_ms = config.fetch.attempt_timeout_ms,
        retry_delay_ms = config.fetch.retry_delay_ms,
        backoff = ?config.fetch.backoff,
        "Configuration loaded"
    );

    let credentials = Credentials::resolve(&config.credentials);

    let state = AppState::from_config(&config, &credentials)
        .context("Failed to initialize provider HTTP client")?;

    if config.cache.sweep_interval_secs > 0 {
        spawn_cache_sweeper(
            Arc::clone(&state.cache),
            Duration::from_secs(config.cache.sweep_interval_secs),
        );
        info!(
            interval_secs = config.cache.sweep_interval_secs,
            "Cache sweeper started"
        );
    }

    let app = build_router(state);

    let ip = config
        .host
        .parse()
        .with_context(|| format!("Invalid host address: {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
