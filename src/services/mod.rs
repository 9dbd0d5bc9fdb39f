//! Service collaborators behind trait seams.
//!
//! The endpoint handlers depend on these interfaces, never on Diesel or
//! Redis directly. Production wiring injects the Diesel-backed
//! implementations; tests inject in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::users::User;
use crate::utils::errors::AuthServiceError;

pub mod token_store;
pub mod unit_of_work;
pub mod users;

pub use token_store::DieselTokenStore;
pub use unit_of_work::DieselUnitOfWork;
pub use users::DieselUsersService;

/// An issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a refresh-token lookup: the owning user plus the token's
/// remaining validity window.
#[derive(Debug, Clone)]
pub struct RefreshTokenLookup {
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Authenticates credentials against the user store.
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Returns the user matching the credentials, or `None` when either the
    /// username is unknown or the password does not verify. Callers must not
    /// learn which of the two failed.
    async fn find_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthServiceError>;
}

/// Issues, looks up, and revokes token pairs.
#[async_trait]
pub trait TokenStoreService: Send + Sync {
    /// Creates a fresh token pair for a user. When `source_refresh_token` is
    /// given the pair is a rotation: the source is consumed atomically with
    /// the new issue, and a source that was already consumed is an
    /// authentication failure.
    async fn create_tokens(
        &self,
        user: &User,
        source_refresh_token: Option<&str>,
    ) -> Result<TokenPair, AuthServiceError>;

    /// Looks up a live refresh token. Unknown, revoked, consumed, and
    /// expired tokens are all `None`.
    async fn find_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshTokenLookup>, AuthServiceError>;

    /// Revokes every live refresh token belonging to a user, optionally
    /// widening to rows rotated from the presented token.
    async fn revoke_user_tokens(
        &self,
        user_id: i32,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthServiceError>;
}

/// Transactional boundary committed after persisted state changes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&self) -> Result<(), AuthServiceError>;
}
