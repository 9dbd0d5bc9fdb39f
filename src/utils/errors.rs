//! Unified error handling for the account service.
//!
//! Two-layer architecture:
//!
//! 1. **Public layer (`ApiError`, `ApiStatus`)**: the API contract — the JSON
//!    structure and HTTP status codes returned to the client.
//! 2. **Internal layer (`AuthServiceError` and its error groups)**: errors
//!    inside the business logic, with source errors and `SpanTrace` context
//!    for logging.
//!
//! Conversion from the internal to the public layer happens in one place:
//! `impl From<AuthServiceError> for ApiError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use tracing_error::SpanTrace;

// =============================================================================
// LAYER 1: PUBLIC API CONTRACT
// =============================================================================

/// Machine-readable error statuses. Serializes to `snake_case` in JSON.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    ValidationError,
    Unauthorized,
    NotFound,
    InternalError,
    ConfigurationError,
    ServiceUnavailable,
}

/// API error response structure, ensuring consistent JSON error bodies.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Machine-readable error code.
    pub status: ApiStatus,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    pub fn new(status: ApiStatus, msg: impl Into<String>) -> Self {
        ApiError {
            status,
            message: msg.into(),
        }
    }

    #[inline]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ApiStatus::ValidationError, msg)
    }

    #[inline]
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ApiStatus::Unauthorized, msg)
    }

    #[inline]
    pub fn not_found(resource: &str) -> Self {
        Self::new(ApiStatus::NotFound, format!("{} not found", resource))
    }

    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ApiStatus::InternalError, msg)
    }

    #[inline]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ApiStatus::ConfigurationError, msg)
    }

    #[inline]
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ApiStatus::ServiceUnavailable, msg)
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            ApiStatus::ValidationError => StatusCode::BAD_REQUEST,
            ApiStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiStatus::NotFound => StatusCode::NOT_FOUND,
            ApiStatus::InternalError | ApiStatus::ConfigurationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiStatus::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// =============================================================================
// LAYER 2: INTERNAL APPLICATION ERRORS
// =============================================================================

/// Groups all errors related to database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection pool error")]
    ConnectionPool {
        #[source]
        source: r2d2::Error,
        span: SpanTrace,
    },
    #[error("Database query error")]
    Query {
        #[source]
        source: diesel::result::Error,
        span: SpanTrace,
    },
    #[error("Database migration error")]
    Migration {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        span: SpanTrace,
    },
}

/// Groups all errors related to Redis cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis connection error")]
    Connection {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        span: SpanTrace,
    },
    #[error("Redis operation error")]
    Operation {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        span: SpanTrace,
    },
}

/// Groups all errors related to JWT token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT token has expired")]
    Expired { span: SpanTrace },
    #[error("JWT token signature is invalid")]
    InvalidSignature { span: SpanTrace },
    #[error("JWT token format is invalid")]
    Invalid { span: SpanTrace },
    #[error("JWT token has been revoked")]
    Revoked { span: SpanTrace },
    #[error("JWT configuration error: {message}")]
    Configuration { message: String, span: SpanTrace },
}

/// The main, unified error type for the business logic.
#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("Invalid value for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

// =============================================================================
// CONVERSIONS FROM LIBRARY ERRORS
// =============================================================================

impl From<r2d2::Error> for DatabaseError {
    fn from(err: r2d2::Error) -> Self {
        DatabaseError::ConnectionPool {
            source: err,
            span: SpanTrace::capture(),
        }
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        DatabaseError::Query {
            source: err,
            span: SpanTrace::capture(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Operation {
            source: Box::new(err),
            span: SpanTrace::capture(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired {
                span: SpanTrace::capture(),
            },
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature {
                span: SpanTrace::capture(),
            },
            _ => JwtError::Invalid {
                span: SpanTrace::capture(),
            },
        }
    }
}

impl From<diesel::result::Error> for AuthServiceError {
    fn from(err: diesel::result::Error) -> Self {
        AuthServiceError::Database(DatabaseError::from(err))
    }
}

impl From<r2d2::Error> for AuthServiceError {
    fn from(err: r2d2::Error) -> Self {
        AuthServiceError::Database(DatabaseError::from(err))
    }
}

impl From<redis::RedisError> for AuthServiceError {
    fn from(err: redis::RedisError) -> Self {
        AuthServiceError::Cache(CacheError::from(err))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthServiceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthServiceError::Jwt(JwtError::from(err))
    }
}

// Helper constructors
impl AuthServiceError {
    pub fn validation(field: &str, message: &str) -> Self {
        AuthServiceError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        AuthServiceError::Authentication(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AuthServiceError::Configuration(msg.into())
    }

    pub fn database(msg: &str) -> Self {
        AuthServiceError::Database(DatabaseError::Query {
            source: diesel::result::Error::QueryBuilderError(msg.into()),
            span: SpanTrace::capture(),
        })
    }
}

// =============================================================================
// INTERNAL -> PUBLIC CONVERSION
// =============================================================================

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Validation { field, message } => {
                ApiError::validation(format!("{}: {}", field, message))
            }

            AuthServiceError::Authentication(msg) => ApiError::unauthorized(msg),

            AuthServiceError::Configuration(msg) => {
                error!(error = %msg, "Configuration error");
                ApiError::configuration(msg)
            }

            AuthServiceError::Database(db_err) => match db_err {
                DatabaseError::ConnectionPool { source, .. } => {
                    error!(error = %source, "Database connection pool exhausted or unreachable");
                    ApiError::service_unavailable("Could not get a database connection")
                }
                DatabaseError::Migration { source, .. } => {
                    error!(error = %source, "Database migration failure");
                    ApiError::internal("Failed to run database migrations")
                }
                DatabaseError::Query { source, .. } => match source {
                    diesel::result::Error::NotFound => ApiError::not_found("Resource"),
                    other => {
                        error!(error = %other, "Unexpected database error");
                        ApiError::internal("An unexpected database error occurred")
                    }
                },
            },

            AuthServiceError::Cache(cache_err) => match cache_err {
                CacheError::Connection { source, .. } => {
                    warn!(error = %source, "Cache service unreachable");
                    ApiError::service_unavailable("Could not connect to cache service")
                }
                CacheError::Operation { source, .. } => {
                    error!(error = %source, "Cache operation failed");
                    ApiError::internal("Cache operation failed")
                }
            },

            AuthServiceError::Jwt(jwt_err) => match jwt_err {
                JwtError::Expired { .. } => ApiError::unauthorized("Token has expired"),
                JwtError::InvalidSignature { .. } => ApiError::unauthorized("Invalid token"),
                JwtError::Invalid { .. } => ApiError::unauthorized("Invalid token"),
                JwtError::Revoked { .. } => ApiError::unauthorized("Token has been revoked"),
                JwtError::Configuration { message, .. } => {
                    error!(error = %message, "JWT configuration error");
                    ApiError::configuration(message)
                }
            },
        }
    }
}

// =============================================================================
// AXUM FRAMEWORK INTEGRATION
// =============================================================================

/// Allows handlers to return `Result<_, AuthServiceError>` directly.
impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Converts the final `ApiError` into an HTTP response with the correct
/// status code and JSON body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
