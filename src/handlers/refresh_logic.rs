//! Business logic for token refresh (rotation).

use tracing::info;

use crate::app::AppState;
use crate::handlers::login_logic::TokenPairResponse;
use crate::utils::errors::AuthServiceError;

/// Looks up the presented refresh token and exchanges it for a new pair.
/// The exchange consumes the presented token: a second attempt with the
/// same token fails.
pub async fn process_token_refresh(
    app_state: &AppState,
    refresh_token: &str,
) -> Result<TokenPairResponse, AuthServiceError> {
    let lookup = app_state.tokens.find_token(refresh_token).await?;

    let lookup = match lookup {
        Some(lookup) => lookup,
        None => {
            info!("Refresh failed: token unknown or no longer valid");
            return Err(AuthServiceError::authentication(
                "Refresh token is unknown or expired",
            ));
        }
    };

    let pair = app_state
        .tokens
        .create_tokens(&lookup.user, Some(refresh_token))
        .await?;

    info!(user_id = lookup.user.id, "Refresh token rotated");
    Ok(pair.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{init_test_env, memory_state_with_handles};

    #[tokio::test]
    async fn unknown_token_is_an_authentication_failure() {
        init_test_env();
        let (state, _tokens, _uow) = memory_state_with_handles();

        let err = process_token_refresh(&state, "missing").await.unwrap_err();
        assert!(matches!(err, AuthServiceError::Authentication(_)));
    }

    #[tokio::test]
    async fn exchange_returns_a_fresh_pair() {
        init_test_env();
        let (state, tokens, _uow) = memory_state_with_handles();
        let alice = tokens.user_fixture("alice");
        let pair = tokens.issue_for(&alice);

        let new_pair = process_token_refresh(&state, &pair.refresh_token)
            .await
            .unwrap();

        assert_ne!(new_pair.refresh_token, pair.refresh_token);
        assert!(!new_pair.access_token.is_empty());
    }
}
