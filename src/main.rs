//! Account service main entry point.
//!
//! Startup sequence:
//!
//! 1. Configure structured logging
//! 2. Load and validate environment configuration
//! 3. Establish service dependencies (database, optional Redis)
//! 4. Apply database migrations
//! 5. Build the HTTP application with routes and middleware
//! 6. Serve with graceful shutdown handling

use axum::Server;
use dotenvy::dotenv;
use redis::Client as RedisClient;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::app::{build_app, AppState};
use crate::config::database::{init_pool, run_migrations, DbPool};
use crate::config::redis::{check_redis_connection, init_redis};

mod app;
mod config;
mod db;
mod handlers;
mod middleware;
mod services;
mod utils;

/// Default port if not specified in environment.
const DEFAULT_PORT: u16 = 3000;

/// Default host address if not specified in environment.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Required environment variables that must be present for the service to start.
const REQUIRED_ENV_VARS: &[&str] = &["DATABASE_URL", "JWT_SECRET"];

/// Optional environment variables that enhance service functionality if present.
const OPTIONAL_ENV_VARS: &[&str] = &["REDIS_URL", "HOST", "PORT"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive for the process lifetime so buffered log lines
    // are flushed on shutdown.
    let _log_guard = setup_logging()?;
    info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Server initialization: logging configured"
    );

    // Load environment variables from .env file if present
    dotenv().ok();
    info!("Server initialization: environment loaded");

    check_required_env_vars();

    let (pool, redis_client) = initialize_services().await?;
    info!("Server initialization: services initialized");

    let state = Arc::new(AppState::new(pool, redis_client));
    let app = build_app(state).await;
    info!("Server initialization: application built");

    let addr = get_server_address()?;
    info!(address = %addr, "Server startup: listening");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown: complete");
    Ok(())
}

/// Sets up structured JSON logging with a non-blocking writer.
fn setup_logging() -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let (writer, guard) = non_blocking(std::io::stdout());

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default().with(filter).with(fmt_layer).init();

    Ok(guard)
}

/// Initializes service dependencies: the database pool (required, with
/// migrations) and Redis (optional — features degrade with a warning).
async fn initialize_services(
) -> Result<(DbPool, Option<RedisClient>), Box<dyn std::error::Error>> {
    let pool = init_pool();

    pool.get().map_err(|e| {
        error!(error = %e, "Database connection failed");
        e
    })?;
    info!("Server initialization: database pool ready");

    run_migrations(&pool).map_err(|e| {
        error!(error = %e, "Database migrations failed");
        e
    })?;
    info!("Server initialization: database migrations applied");

    let redis_client = match init_redis() {
        Ok(client) => {
            if check_redis_connection(&client).await {
                info!("Server initialization: Redis connected");
                Some(client)
            } else {
                warn!("Server initialization: Redis ping failed, disabling denylist features");
                None
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                "Server initialization: Redis not configured, disabling denylist features"
            );
            None
        }
    };

    Ok((pool, redis_client))
}

/// Validates required and optional environment variables, logging what is
/// missing. Startup proceeds so the specific failure surfaces where the
/// variable is first needed.
fn check_required_env_vars() {
    let mut missing_required = false;

    for &var in REQUIRED_ENV_VARS {
        if env::var(var).is_err() {
            error!(variable = var, "Missing required environment variable");
            missing_required = true;
        }
    }

    if !missing_required {
        info!("Server initialization: required environment variables present");
    }

    let missing: Vec<_> = OPTIONAL_ENV_VARS
        .iter()
        .filter(|&&var| env::var(var).is_err())
        .collect();

    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "Server initialization: some optional environment variables missing"
        );
    }
}

/// Determines the server binding address from HOST/PORT, with defaults.
fn get_server_address() -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

    let addr = format!("{}:{}", host, port).parse()?;

    Ok(addr)
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received: Ctrl+C");
    };

    #[cfg(unix)]
    let sigterm = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Shutdown signal received: SIGTERM");
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_address_defaults() {
        env::remove_var("HOST");
        env::remove_var("PORT");

        let addr = get_server_address().unwrap();
        assert_eq!(
            addr.to_string(),
            format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT)
        );
    }

    #[test]
    fn required_env_vars_are_consistent() {
        assert!(REQUIRED_ENV_VARS.contains(&"DATABASE_URL"));
        assert!(REQUIRED_ENV_VARS.contains(&"JWT_SECRET"));
    }
}
