//! Auth Service
//!
//! Entry point for the token authority: login, registration, refresh
//! rotation and token introspection over HTTP.

use auth_service::config::Config;
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::repositories::InMemoryUserRepository;
use auth_service::routes::{self, AppState};
use auth_service::services::{AuthService, TokenAuthority};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration before tracing so LOG_FORMAT can pick the formatter.
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(config.json_logs);

    info!("Starting Auth Service");
    info!(
        bind_address = %config.bind_address,
        access_token_ttl_ms = config.access_token_ttl_ms,
        refresh_token_ttl_ms = config.refresh_token_ttl_ms,
        jwt_clock_skew_seconds = config.clock_skew.as_secs(),
        bcrypt_cost = config.bcrypt_cost,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let authority = TokenAuthority::from_config(&config);
    let users = Arc::new(InMemoryUserRepository::new());
    let auth = AuthService::new(authority, users, config.bcrypt_cost).map_err(|e| {
        error!("Failed to initialize auth service: {}", e);
        e
    })?;

    let state = Arc::new(AppState { auth });
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Auth Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(config.drain_seconds))
    .await?;

    info!("Auth Service shutdown complete");

    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "auth_service=debug,auth=debug,tower_http=debug".into());

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Resolves on SIGINT or SIGTERM, after the configured drain period.
async fn shutdown_signal(drain_secs: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    }
}
