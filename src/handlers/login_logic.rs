//! Business logic for login.

use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::handlers::login::LoginRequest;
use crate::services::TokenPair;
use crate::utils::errors::AuthServiceError;

/// The single message used for every credential failure. Unknown username,
/// wrong password, and inactive account must be indistinguishable to the
/// caller (account enumeration resistance).
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Token pair as returned on the wire.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Authenticates the credentials and issues a fresh token pair with no
/// rotation source.
pub async fn process_login(
    app_state: &AppState,
    req: &LoginRequest,
) -> Result<TokenPairResponse, AuthServiceError> {
    let user = app_state
        .users
        .find_user(req.username.trim(), &req.password)
        .await?;

    let user = match user {
        Some(user) => user,
        None => {
            info!("Login failed: credentials did not match");
            return Err(AuthServiceError::authentication(INVALID_CREDENTIALS));
        }
    };

    if !user.is_active {
        info!(user_id = user.id, "Login failed: account inactive");
        return Err(AuthServiceError::authentication(INVALID_CREDENTIALS));
    }

    let pair = app_state.tokens.create_tokens(&user, None).await?;

    info!(user_id = user.id, "User authenticated");
    Ok(pair.into())
}
