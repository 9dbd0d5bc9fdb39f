//! Persisted refresh tokens.
//!
//! Refresh tokens are opaque strings handed to clients; only their SHA-256
//! hash is stored. A row records which user it belongs to, when it expires,
//! which token it was rotated from (if any), and when it was revoked or
//! consumed. Lookup only ever returns live rows: unrevoked and unexpired.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::{Insertable, PgConnection, Queryable};
use sha2::{Digest, Sha256};

use crate::db::schema::refresh_tokens;
use crate::utils::errors::AuthServiceError;

/// Refresh-token lifetime.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

// =============================================================================
// DATA MODELS
// =============================================================================

/// Stored refresh-token row.
#[derive(Debug, Clone, Queryable)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub source_token_hash: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// New refresh-token row for insertion.
#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: i32,
    pub token_hash: String,
    pub source_token_hash: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// IMPLEMENTATION
// =============================================================================

impl RefreshToken {
    /// SHA-256 hash of a token, hex-encoded, as stored at rest.
    pub fn hash(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        hex::encode(digest)
    }

    /// Builds an insertable row for a freshly issued token.
    pub fn new_row(user_id: i32, token: &str, source_token: Option<&str>) -> NewRefreshToken {
        let now = Utc::now();
        NewRefreshToken {
            user_id,
            token_hash: Self::hash(token),
            source_token_hash: source_token.map(Self::hash),
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            created_at: now,
        }
    }

    /// Inserts a row, returning the stored record.
    pub fn insert(
        conn: &mut PgConnection,
        row: &NewRefreshToken,
    ) -> Result<RefreshToken, AuthServiceError> {
        diesel::insert_into(refresh_tokens::table)
            .values(row)
            .get_result::<RefreshToken>(conn)
            .map_err(AuthServiceError::from)
    }

    /// Finds a live row by the presented token: unrevoked and unexpired.
    pub fn find_active(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<RefreshToken>, AuthServiceError> {
        use crate::db::schema::refresh_tokens::dsl::*;

        refresh_tokens
            .filter(token_hash.eq(Self::hash(token)))
            .filter(revoked_at.is_null())
            .filter(expires_at.gt(Utc::now()))
            .first::<RefreshToken>(conn)
            .optional()
            .map_err(AuthServiceError::from)
    }

    /// Marks the presented token consumed (rotation). Returns the number of
    /// rows affected: zero means the token was already consumed or revoked.
    pub fn consume(conn: &mut PgConnection, token: &str) -> Result<usize, AuthServiceError> {
        use crate::db::schema::refresh_tokens::dsl::*;

        diesel::update(
            refresh_tokens
                .filter(token_hash.eq(Self::hash(token)))
                .filter(revoked_at.is_null()),
        )
        .set(revoked_at.eq(Some(Utc::now())))
        .execute(conn)
        .map_err(AuthServiceError::from)
    }

    /// Revokes every live token for a user. When `source_token` is given, any
    /// rows rotated from it are revoked as well, covering the chain even if
    /// ownership records diverge.
    pub fn revoke_all_for_user(
        conn: &mut PgConnection,
        owner_id: i32,
        source_token: Option<&str>,
    ) -> Result<usize, AuthServiceError> {
        use crate::db::schema::refresh_tokens::dsl::*;

        let now = Some(Utc::now());

        let mut revoked = diesel::update(
            refresh_tokens
                .filter(user_id.eq(owner_id))
                .filter(revoked_at.is_null()),
        )
        .set(revoked_at.eq(now))
        .execute(conn)
        .map_err(AuthServiceError::from)?;

        if let Some(token) = source_token {
            revoked += diesel::update(
                refresh_tokens
                    .filter(source_token_hash.eq(Some(Self::hash(token))))
                    .filter(revoked_at.is_null()),
            )
            .set(revoked_at.eq(now))
            .execute(conn)
            .map_err(AuthServiceError::from)?;
        }

        Ok(revoked)
    }
}

// =============================================================================
// TESTS
// =============================================================================
