//! Business logic for logout: persisted revocation plus access-token
//! denylisting.

use tracing::{info, warn};

use crate::app::AppState;
use crate::middleware::auth::AuthSession;
use crate::utils::errors::AuthServiceError;
use crate::utils::jwt;

/// Revokes the caller's refresh tokens and commits, then denylists the
/// presented access token.
///
/// The denylist write is best-effort: the durable revocation has already
/// committed, and the access token dies on its own at expiry. A missing
/// Redis client means the feature is disabled, not an error.
pub async fn process_logout(
    app_state: &AppState,
    session: &AuthSession,
    refresh_token: Option<&str>,
) -> Result<(), AuthServiceError> {
    app_state
        .tokens
        .revoke_user_tokens(session.user_id, refresh_token)
        .await?;

    app_state.uow.commit().await?;

    info!(user_id = session.user_id, "Refresh tokens revoked and committed");

    if let Some(client) = &app_state.redis_client {
        if let Err(e) = jwt::revoke_token(&session.token, client).await {
            warn!(error = ?e, "Failed to denylist access token after logout");
        }
    }

    Ok(())
}
