//! HTTP handler for the login endpoint.
//!
//! Validates the credentials payload, delegates authentication and token
//! issuance to the collaborators, and maps failures to 400/401 responses.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, span, Instrument, Level};

use crate::{
    app::AppState,
    handlers::login_logic::process_login,
    utils::errors::AuthServiceError,
    utils::validators::require_field,
};

/// Request payload for login. Accepts the PascalCase field names some
/// clients of the original API send.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

/// Handles POST /api/account/login requests.
///
/// # Response Format
/// - 200 OK: `{"access_token": ..., "refresh_token": ...}`
/// - 400 Bad Request: missing payload or blank field
/// - 401 Unauthorized: unknown user, wrong password, or inactive account
///   (indistinguishable on purpose)
pub async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let span = span!(Level::INFO, "http_request",
        method = "POST",
        path = "/api/account/login",
    );

    async move {
        info!("Received login request");

        let Json(req) = payload
            .ok_or_else(|| AuthServiceError::validation("user", "is not set"))?;

        require_field("username", &req.username)?;
        require_field("password", &req.password)?;

        let tokens = process_login(&app_state, &req).await?;

        info!("Login successful");
        Ok((StatusCode::OK, Json(tokens)))
    }
    .instrument(span)
    .await
}
