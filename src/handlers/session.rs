//! Session-introspection endpoints.
//!
//! Both endpoints are pure reads of the request's authentication state. They
//! accept GET and POST, matching the original API surface.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::debug;

use crate::middleware::auth::AuthSession;
use crate::utils::errors::AuthServiceError;

/// User info as returned on the wire. The original API capitalizes the key.
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    #[serde(rename = "Username")]
    pub username: String,
}

/// Handles GET/POST /api/account/is-authenticated requests.
///
/// Returns a bare boolean reflecting whether a valid session accompanies the
/// request. Never fails: an absent, malformed, or rejected token simply
/// reads as `false`.
pub async fn is_authenticated_handler(session: Option<AuthSession>) -> impl IntoResponse {
    let authenticated = session.is_some();
    debug!(authenticated, "Session introspection");
    (StatusCode::OK, Json(authenticated))
}

/// Handles GET/POST /api/account/user-info requests.
///
/// Returns the authenticated identity's display name; 401 without a valid
/// session.
pub async fn user_info_handler(
    session: AuthSession,
) -> Result<impl IntoResponse, AuthServiceError> {
    Ok((
        StatusCode::OK,
        Json(UserInfoResponse {
            username: session.username,
        }),
    ))
}
