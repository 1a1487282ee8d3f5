//! Global Remit identity server.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use remit_api::{Stores, build_app, build_state};
use remit_auth::{SessionCleanup, SigningKeys};
use remit_cache::provider::CacheManager;
use remit_core::config::AppConfig;
use remit_core::config::logging::LoggingConfig;
use remit_core::error::AppError;
use remit_database::DatabasePool;
use remit_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let env = std::env::var("REMIT_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Global Remit identity server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Signing keys (fatal if missing) ──────────────────
    let keys = SigningKeys::from_config(&config.auth)?;
    tracing::info!("Signing keys loaded");

    // ── Step 2: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(database.pool()).await?;
    }

    // ── Step 3: Cache ────────────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 4: Services and state ───────────────────────────────
    let stores = Stores::postgres(&database);
    let server_config = config.server.clone();
    let cleanup_interval = config.session.cleanup_interval_minutes;
    let state = build_state(config, stores, cache, keys, Some(database.clone()));

    // ── Step 5: Shutdown channel + background session sweep ──────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cleanup_handle = if cleanup_interval > 0 {
        let cleanup = SessionCleanup::new(
            state.sessions.clone(),
            Duration::from_secs(cleanup_interval * 60),
        );
        Some(tokio::spawn(cleanup.run(shutdown_rx.clone())))
    } else {
        tracing::info!("Session cleanup disabled");
        None
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let app = build_app(state);
    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Identity server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    if let Some(handle) = cleanup_handle {
        let grace = Duration::from_secs(server_config.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Session cleanup did not stop within the grace period");
        }
    }

    database.close().await;
    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
