//! HTTP handler for the token-refresh endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, span, Instrument, Level};

use crate::{
    app::AppState,
    handlers::refresh_logic::process_token_refresh,
    utils::errors::AuthServiceError,
    utils::validators::require_some,
};

/// Request payload for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Handles POST /api/account/refresh-token requests.
///
/// # Response Format
/// - 200 OK: new token pair; the presented refresh token is consumed
/// - 400 Bad Request: missing or blank `refreshToken` field
/// - 401 Unauthorized: unknown, revoked, consumed, or expired token
pub async fn refresh_token_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let span = span!(Level::INFO, "http_request",
        method = "POST",
        path = "/api/account/refresh-token",
    );

    async move {
        info!("Received token refresh request");

        let Json(req) = payload
            .ok_or_else(|| AuthServiceError::validation("refreshToken", "is not set"))?;
        let refresh_token = require_some("refreshToken", req.refresh_token.as_deref())?;

        let tokens = process_token_refresh(&app_state, refresh_token).await?;

        info!("Token refresh successful");
        Ok((StatusCode::OK, Json(tokens)))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::utils::test_utils::{init_test_env, memory_state_with_handles};

    fn refresh_request(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/account/refresh-token")
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn missing_field_returns_400() {
        init_test_env();
        let (state, _tokens, _uow) = memory_state_with_handles();
        let app = Router::new()
            .route("/api/account/refresh-token", post(refresh_token_handler))
            .with_state(state);

        let response = app
            .oneshot(refresh_request(Body::from(json!({}).to_string())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_field_returns_400() {
        init_test_env();
        let (state, _tokens, _uow) = memory_state_with_handles();
        let app = Router::new()
            .route("/api/account/refresh-token", post(refresh_token_handler))
            .with_state(state);

        let response = app
            .oneshot(refresh_request(Body::from(
                json!({"refreshToken": "   "}).to_string(),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_token_returns_401() {
        init_test_env();
        let (state, _tokens, _uow) = memory_state_with_handles();
        let app = Router::new()
            .route("/api/account/refresh-token", post(refresh_token_handler))
            .with_state(state);

        let response = app
            .oneshot(refresh_request(Body::from(
                json!({"refreshToken": "no-such-token"}).to_string(),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn known_token_rotates_and_rejects_replay() {
        init_test_env();
        let (state, tokens, _uow) = memory_state_with_handles();
        let alice = tokens.user_fixture("alice");
        let pair = tokens.issue_for(&alice);

        let app = Router::new()
            .route("/api/account/refresh-token", post(refresh_token_handler))
            .with_state(state.clone());

        // First exchange succeeds and returns a different pair.
        let response = app
            .clone()
            .oneshot(refresh_request(Body::from(
                json!({"refreshToken": pair.refresh_token}).to_string(),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let new_refresh = body["refresh_token"].as_str().unwrap().to_string();
        assert!(!body["access_token"].as_str().unwrap().is_empty());
        assert_ne!(new_refresh, pair.refresh_token);

        // Replaying the consumed token is rejected.
        let response = app
            .clone()
            .oneshot(refresh_request(Body::from(
                json!({"refreshToken": pair.refresh_token}).to_string(),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // The rotated token works.
        let response = app
            .oneshot(refresh_request(Body::from(
                json!({"refreshToken": new_refresh}).to_string(),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
