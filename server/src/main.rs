//! Todos Server - Main entry point.
//!
//! This binary starts the todos web application with:
//! - Structured JSON logging for production
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//! - Background cleanup of expired in-memory sessions
//!
//! # Configuration
//!
//! See [`todos_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! # In-memory sessions on the default port
//! cargo run --bin todos-server
//!
//! # Signed cookie sessions
//! TODOS_SESSION_STORE=cookie \
//! TODOS_SESSION_SECRET="$(openssl rand -base64 32)" \
//! PORT=8080 \
//! cargo run --release --bin todos-server
//! ```

use std::process::ExitCode;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use todos_server::config::{Config, SessionBackend};
use todos_server::routes::{create_router, AppState};
use todos_server::session::{spawn_cleanup_task, store_from_config};

/// Cleanup interval for expired in-memory sessions (60 seconds).
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  PORT                    - HTTP server port (default: 4567)");
            eprintln!("  RUST_LOG                - Log level filter (default: info)");
            eprintln!("  TODOS_SESSION_STORE     - Session backend: memory or cookie (default: memory)");
            eprintln!("  TODOS_SESSION_SECRET    - Base64 32-byte signing key (required for cookie)");
            eprintln!("  TODOS_SESSION_TTL_SECS  - Idle lifetime of in-memory sessions (default: 86400)");
            eprintln!("  TODOS_MAX_SESSIONS      - Maximum in-memory sessions (default: 10000)");
            return ExitCode::from(1);
        }
    };

    let store = match store_from_config(&config) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "Failed to create session store");
            return ExitCode::from(1);
        }
    };

    info!(
        port = config.port,
        session_store = store.name(),
        "Todos server starting"
    );

    let cleanup_handle = match config.session_backend {
        SessionBackend::Memory => {
            info!(
                interval_secs = SESSION_CLEANUP_INTERVAL.as_secs(),
                "Session cleanup task started"
            );
            Some(spawn_cleanup_task(store.clone(), SESSION_CLEANUP_INTERVAL))
        }
        SessionBackend::Cookie => None,
    };

    let port = config.port;
    let app = create_router(AppState::new(config, store));

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => {
            info!(port, address = %bind_addr, "Server listening");
            listener
        }
        Err(err) => {
            error!(
                error = %err,
                address = %bind_addr,
                "Failed to bind to address"
            );
            return ExitCode::from(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready to accept connections");

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        return ExitCode::from(1);
    }

    info!("Server shutting down gracefully");

    if let Some(handle) = cleanup_handle {
        handle.abort();
        info!("Session cleanup task stopped");
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Initialize structured logging with tracing.
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with request
/// tracing from `tower_http` at `debug`.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,axum::rejection=trace"));

    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();
}

/// Resolves when SIGTERM or SIGINT is received.
///
/// axum stops accepting new connections and lets in-flight requests finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
