//! Database configuration and connection pool management.
//!
//! Provides PostgreSQL connectivity with connection pooling and automatic
//! migrations.

use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use crate::utils::errors::{AuthServiceError, DatabaseError};

// =============================================================================
// TYPE DEFINITIONS
// =============================================================================

/// Database connection pool type.
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Pooled database connection type.
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

// =============================================================================
// CONFIGURATION
// =============================================================================

const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Helper to parse an environment variable with a default value.
fn get_env_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// POOL INITIALIZATION
// =============================================================================

/// Initializes the database connection pool with configurable settings.
///
/// # Configuration (from environment variables with defaults)
/// - `DATABASE_URL`: the connection string (required).
/// - `DB_MAX_POOL_SIZE`: max connections (default: 25).
/// - `DB_MIN_IDLE`: min idle connections (default: 2).
/// - `DB_CONNECTION_TIMEOUT_SECS`: connection timeout (default: 10).
///
/// # Panics
/// Panics if `DATABASE_URL` is not set or pool creation fails (fail-fast for
/// startup).
pub fn init_pool() -> DbPool {
    let database_url = env::var(DATABASE_URL_ENV).unwrap_or_else(|_| {
        error!("Missing {} environment variable", DATABASE_URL_ENV);
        panic!("DATABASE_URL must be set in .env or environment variables");
    });

    let max_size = get_env_var("DB_MAX_POOL_SIZE", 25u32);
    let min_idle = get_env_var("DB_MIN_IDLE", 2u32);
    let connection_timeout = get_env_var("DB_CONNECTION_TIMEOUT_SECS", 10u64);

    info!("Initializing PostgreSQL connection pool");

    let manager = ConnectionManager::<PgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(min_idle))
        .connection_timeout(Duration::from_secs(connection_timeout))
        .test_on_check_out(true)
        .build(manager)
        .unwrap_or_else(|e| {
            error!("Failed to create PostgreSQL connection pool: {}", e);
            panic!("Failed to create database connection pool: {}", e);
        });

    info!(
        "PostgreSQL pool initialized (max={}, min_idle={}, timeout={}s)",
        max_size, min_idle, connection_timeout
    );

    pool
}

// =============================================================================
// CONNECTION MANAGEMENT
// =============================================================================

/// Acquires a database connection from the pool.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, AuthServiceError> {
    pool.get().map_err(|e| {
        error!("Failed to acquire database connection: {}", e);
        AuthServiceError::from(e)
    })
}

// =============================================================================
// DATABASE MIGRATIONS
// =============================================================================

/// Runs pending database migrations.
///
/// Migrations are embedded in the binary and run automatically on startup so
/// the schema is always up to date.
pub fn run_migrations(pool: &DbPool) -> Result<(), AuthServiceError> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
    use tracing_error::SpanTrace;

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    info!("Checking for pending database migrations");
    let mut conn = get_connection(pool)?;

    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date");
            } else {
                info!("Applied {} migration(s)", applied.len());
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            Err(AuthServiceError::Database(DatabaseError::Migration {
                source: e,
                span: SpanTrace::capture(),
            }))
        }
    }
}
