//! Authenticated-session extraction for protected routes.
//!
//! `AuthSession` is the explicit authenticated-context object handlers
//! receive instead of digging through framework claims: a verified user id
//! and display name pulled from the Bearer token, plus the raw token so
//! logout can denylist it. `Option<AuthSession>` gives the introspection
//! endpoint its yes/no answer without rejecting anonymous callers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::utils::errors::AuthServiceError;
use crate::utils::jwt;

/// Verified identity of the calling session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// User identifier from the verified `sub` claim.
    pub user_id: i32,
    /// Display name from the verified claims.
    pub username: String,
    /// The raw access token as presented, for denylisting on logout.
    pub token: String,
}

/// Extracts the Bearer token from the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| {
            auth.strip_prefix("Bearer ")
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
        })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AuthServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AuthServiceError::authentication("Missing or invalid Authorization header")
        })?;

        let claims = jwt::validate_token(token, state.redis_client.as_ref()).await?;

        let user_id = claims.sub.parse::<i32>().map_err(|_| {
            warn!("Access token with non-numeric subject claim");
            AuthServiceError::authentication("Malformed subject claim")
        })?;

        Ok(AuthSession {
            user_id,
            username: claims.username,
            token: token.to_string(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
