//! HTTP handler for the logout endpoint.
//!
//! Logout is a GET with an optional `refreshToken` query parameter, matching
//! the original API surface. The caller must be authenticated; the identity
//! comes from the verified session, never from the request body.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, span, Instrument, Level};

use crate::{
    app::AppState,
    handlers::logout_logic::process_logout,
    middleware::auth::AuthSession,
    utils::errors::AuthServiceError,
};

/// Query parameters for logout.
#[derive(Debug, Deserialize)]
pub struct LogoutParams {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Handles GET /api/account/logout requests.
///
/// Revokes all of the caller's refresh tokens, commits the change, and
/// denylists the presented access token. Returns `true` on success —
/// idempotent, safe to call repeatedly.
pub async fn logout_handler(
    State(app_state): State<Arc<AppState>>,
    session: AuthSession,
    Query(params): Query<LogoutParams>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let span = span!(Level::INFO, "http_request",
        method = "GET",
        path = "/api/account/logout",
        user_id = session.user_id,
    );

    async move {
        info!("Received logout request");

        match process_logout(&app_state, &session, params.refresh_token.as_deref()).await {
            Ok(()) => {
                info!("Logout completed");
                Ok((StatusCode::OK, Json(true)))
            }
            Err(e) => {
                error!(error = ?e, "Logout failed");
                Err(e)
            }
        }
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
        routing::{get, post},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::handlers::refresh::refresh_token_handler;
    use crate::utils::jwt::generate_access_token;
    use crate::utils::test_utils::{init_test_env, memory_state_with_handles};

    fn logout_request(token: Option<&str>, query: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(format!("/api/account/logout{}", query));
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_logout_returns_401() {
        init_test_env();
        let (state, _tokens, _uow) = memory_state_with_handles();
        let app = Router::new()
            .route("/api/account/logout", get(logout_handler))
            .with_state(state);

        let response = app.oneshot(logout_request(None, "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_returns_true_and_commits() {
        init_test_env();
        let (state, tokens, uow) = memory_state_with_handles();
        let alice = tokens.user_fixture("alice");
        let access = generate_access_token(alice.id, &alice.username, None).unwrap();

        let app = Router::new()
            .route("/api/account/logout", get(logout_handler))
            .with_state(state);

        let response = app.oneshot(logout_request(Some(&access), "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"true");
        assert!(uow.commit_count() >= 1);
    }

    #[tokio::test]
    async fn logout_revokes_outstanding_refresh_tokens() {
        init_test_env();
        let (state, tokens, _uow) = memory_state_with_handles();
        let alice = tokens.user_fixture("alice");
        let pair = tokens.issue_for(&alice);
        let access = generate_access_token(alice.id, &alice.username, None).unwrap();

        let app = Router::new()
            .route("/api/account/logout", get(logout_handler))
            .route("/api/account/refresh-token", post(refresh_token_handler))
            .with_state(state);

        let response = app
            .clone()
            .oneshot(logout_request(
                Some(&access),
                &format!("?refreshToken={}", pair.refresh_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The revoked refresh token must no longer be exchangeable.
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/account/refresh-token")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({"refreshToken": pair.refresh_token}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
