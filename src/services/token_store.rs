//! Diesel-backed token issuance, rotation, and revocation.
//!
//! Access tokens are signed JWTs minted through `utils::jwt`; refresh tokens
//! are 32 bytes of OS randomness, URL-safe base64 encoded, stored hashed.
//! Rotation consumes the source row and inserts the new one inside a single
//! database transaction, so a refresh token can be exchanged exactly once.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use diesel::Connection;
use rand::RngCore;
use tracing::{debug, warn};

use crate::config::database::{get_connection, DbPool};
use crate::db::tokens::RefreshToken;
use crate::db::users::User;
use crate::services::{RefreshTokenLookup, TokenPair, TokenStoreService};
use crate::utils::errors::AuthServiceError;
use crate::utils::jwt::generate_access_token;

/// Raw entropy per refresh token, before encoding.
const REFRESH_TOKEN_BYTES: usize = 32;

/// `TokenStoreService` over the PostgreSQL refresh-token table.
pub struct DieselTokenStore {
    pool: DbPool,
}

impl DieselTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Generates an opaque refresh token from OS randomness.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[async_trait]
impl TokenStoreService for DieselTokenStore {
    async fn create_tokens(
        &self,
        user: &User,
        source_refresh_token: Option<&str>,
    ) -> Result<TokenPair, AuthServiceError> {
        let access_token = generate_access_token(user.id, &user.username, None)?;
        let refresh_token = generate_refresh_token();

        let mut conn = get_connection(&self.pool)?;
        let row = RefreshToken::new_row(user.id, &refresh_token, source_refresh_token);

        conn.transaction::<_, AuthServiceError, _>(|conn| {
            if let Some(source) = source_refresh_token {
                // Exactly-once exchange: a concurrent rotation of the same
                // token gets here second, affects zero rows, and loses.
                let consumed = RefreshToken::consume(conn, source)?;
                if consumed == 0 {
                    warn!(user_id = user.id, "Refresh token already consumed");
                    return Err(AuthServiceError::authentication(
                        "Refresh token is no longer valid",
                    ));
                }
            }

            RefreshToken::insert(conn, &row)?;
            Ok(())
        })?;

        debug!(user_id = user.id, rotated = source_refresh_token.is_some(), "Token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn find_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshTokenLookup>, AuthServiceError> {
        let mut conn = get_connection(&self.pool)?;

        let record = match RefreshToken::find_active(&mut conn, refresh_token)? {
            Some(record) => record,
            None => return Ok(None),
        };

        match User::find_by_id(&mut conn, record.user_id)? {
            Some(user) => Ok(Some(RefreshTokenLookup {
                user,
                expires_at: record.expires_at,
            })),
            None => {
                // Row outlived its user; treat as unknown.
                warn!(user_id = record.user_id, "Refresh token with no owning user");
                Ok(None)
            }
        }
    }

    async fn revoke_user_tokens(
        &self,
        user_id: i32,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthServiceError> {
        let mut conn = get_connection(&self.pool)?;

        let revoked = conn.transaction::<_, AuthServiceError, _>(|conn| {
            RefreshToken::revoke_all_for_user(conn, user_id, refresh_token)
        })?;

        debug!(user_id, revoked, "User refresh tokens revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::init_test_env;

    #[test]
    fn refresh_tokens_are_url_safe_and_unpadded() {
        let token = generate_refresh_token();
        // 32 bytes -> 43 base64 chars without padding.
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn refresh_tokens_are_unique() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[tokio::test]
    #[ignore] // requires PostgreSQL at DATABASE_URL
    async fn rotation_consumes_the_source_token() {
        init_test_env();
        let pool = crate::config::database::init_pool();
        crate::config::database::run_migrations(&pool).unwrap();

        let username = format!("store_alice_{}", uuid::Uuid::new_v4().simple());
        let mut conn = pool.get().unwrap();
        let user = User::save_new(
            User::new_for_insert(&username, "secret", true),
            &mut conn,
        )
        .unwrap();
        drop(conn);

        let store = DieselTokenStore::new(pool);
        let first = store.create_tokens(&user, None).await.unwrap();

        // First rotation succeeds.
        let second = store
            .create_tokens(&user, Some(&first.refresh_token))
            .await
            .unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // The consumed token no longer looks up, and a replayed rotation fails.
        assert!(store.find_token(&first.refresh_token).await.unwrap().is_none());
        assert!(store
            .create_tokens(&user, Some(&first.refresh_token))
            .await
            .is_err());

        // Revocation kills the live token too.
        store.revoke_user_tokens(user.id, None).await.unwrap();
        assert!(store.find_token(&second.refresh_token).await.unwrap().is_none());
    }
}
