//! Courier Server: realtime hub and token lifecycle service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use tracing_subscriber::{EnvFilter, fmt};

use courier_api::{AppState, build_app};
use courier_auth::{
    DevOtpVerifier, DeviceSessionStore, MemoryDeviceSessionStore, MemoryUserDirectory,
    OtpLoginService, SessionManager, UserDirectory,
};
use courier_core::config::AppConfig;
use courier_core::error::AppError;
use courier_database::{DatabasePool, PgDeviceSessionStore, PgUserDirectory};
use courier_realtime::{ConnectionAdapter, Hub, MemoryParticipants, ParticipantRelay};

#[tokio::main]
async fn main() {
    let env = std::env::var("COURIER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
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

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (session_store, users, db_pool) = init_stores(&config).await?;

    // ── Step 2: Auth system ──────────────────────────────────────
    tracing::info!("Initializing authentication system...");
    let session_manager = SessionManager::from_config(&config.auth, session_store)?;
    let otp_login = OtpLoginService::new(
        Arc::new(DevOtpVerifier::from_config(&config.otp)?),
        users,
        session_manager.clone(),
    );

    // ── Step 3: Realtime hub ─────────────────────────────────────
    tracing::info!(
        client_queue_capacity = config.realtime.client_queue_capacity,
        "Starting realtime hub..."
    );
    let hub = Hub::start(&config.realtime);
    let relay = ParticipantRelay::new(hub.clone(), Arc::new(MemoryParticipants::new()));
    let connections = ConnectionAdapter::new(hub.clone(), Arc::new(relay));

    // ── Step 4: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(Arc::new(config), session_manager, otp_login, connections);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Courier server listening on {}", addr);

    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, closing live connections...");
            hub.shutdown().await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
        }
        _ = async {
            if stopping_rx.wait_for(|stopping| *stopping).await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, forcing shutdown");
        }
    }

    // ── Step 5: Cleanup ──────────────────────────────────────────
    if let Some(pool) = db_pool {
        pool.close().await;
    }
    tracing::info!("Courier server stopped");

    Ok(())
}

type Stores = (
    Arc<dyn DeviceSessionStore>,
    Arc<dyn UserDirectory>,
    Option<DatabasePool>,
);

/// PostgreSQL stores when a URL is configured, in-memory ones otherwise.
async fn init_stores(config: &AppConfig) -> Result<Stores, AppError> {
    if config.database.url.is_none() {
        tracing::warn!("No database URL configured; sessions and users are kept in memory");
        return Ok((
            Arc::new(MemoryDeviceSessionStore::new()),
            Arc::new(MemoryUserDirectory::new()),
            None,
        ));
    }

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    courier_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    Ok((
        Arc::new(PgDeviceSessionStore::new(db.pool().clone())),
        Arc::new(PgUserDirectory::new(db.pool().clone())),
        Some(db),
    ))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
