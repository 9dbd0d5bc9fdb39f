//! Application state and router assembly.

use axum::{
    routing::{get, post},
    Router,
};
use redis::Client as RedisClient;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::database::DbPool;
use crate::handlers::{
    login::login_handler,
    logout::logout_handler,
    refresh::refresh_token_handler,
    session::{is_authenticated_handler, user_info_handler},
};
use crate::services::{
    DieselTokenStore, DieselUnitOfWork, DieselUsersService, TokenStoreService, UnitOfWork,
    UsersService,
};

/// Shared application state: the three collaborators behind trait seams,
/// plus the optional Redis client backing the access-token denylist.
pub struct AppState {
    pub users: Arc<dyn UsersService>,
    pub tokens: Arc<dyn TokenStoreService>,
    pub uow: Arc<dyn UnitOfWork>,
    pub redis_client: Option<RedisClient>,
}

impl AppState {
    /// Wires the production collaborators over the database pool.
    pub fn new(pool: DbPool, redis_client: Option<RedisClient>) -> Self {
        AppState {
            users: Arc::new(DieselUsersService::new(pool.clone())),
            tokens: Arc::new(DieselTokenStore::new(pool.clone())),
            uow: Arc::new(DieselUnitOfWork::new(pool)),
            redis_client,
        }
    }
}

/// Builds the Axum application with all routes and middleware.
pub async fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Account service is running" }))
        .route("/api/account/login", post(login_handler))
        .route("/api/account/refresh-token", post(refresh_token_handler))
        .route("/api/account/logout", get(logout_handler))
        .route(
            "/api/account/is-authenticated",
            get(is_authenticated_handler).post(is_authenticated_handler),
        )
        .route(
            "/api/account/user-info",
            get(user_info_handler).post(user_info_handler),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::utils::test_utils::{init_test_env, memory_state};

    #[tokio::test]
    async fn banner_route_responds() {
        init_test_env();
        let app = build_app(Arc::new(memory_state())).await;

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        init_test_env();
        let app = build_app(Arc::new(memory_state())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/account/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
