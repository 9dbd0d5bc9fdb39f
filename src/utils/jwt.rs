//! Access-token (JWT) creation and validation.
//!
//! Access tokens are short-lived HS256 JWTs carrying the user identifier as
//! the subject plus the display name. Refresh tokens are opaque and live in
//! the token store, so the only JWT type minted here is `access`. Validation
//! optionally consults the Redis denylist populated on logout.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;
use tracing_error::SpanTrace;

use crate::config::redis::is_token_blocked;
use crate::utils::errors::{AuthServiceError, JwtError};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's unique identifier.
    pub sub: String,
    /// Display name for session introspection.
    pub username: String,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
    /// Token type discriminator.
    pub token_type: String,
}

pub const TOKEN_TYPE_ACCESS: &str = "access";

/// Default access-token lifetime.
const ACCESS_TOKEN_TTL_HOURS: i64 = 1;

fn jwt_secret() -> Result<String, AuthServiceError> {
    env::var("JWT_SECRET").map_err(|_| {
        AuthServiceError::Jwt(JwtError::Configuration {
            message: "JWT secret is not configured".to_string(),
            span: SpanTrace::capture(),
        })
    })
}

/// Generates a signed access token for a user.
///
/// `expires_in` overrides the default lifetime; tests use it to mint
/// already-expired tokens.
pub fn generate_access_token(
    user_id: i32,
    username: &str,
    expires_in: Option<Duration>,
) -> Result<String, AuthServiceError> {
    let now = Utc::now();
    let expiration = now + expires_in.unwrap_or_else(|| Duration::hours(ACCESS_TOKEN_TTL_HOURS));

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
        token_type: TOKEN_TYPE_ACCESS.to_string(),
    };

    let secret = jwt_secret()?;

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(AuthServiceError::from)
}

/// Decodes and verifies a token's signature and expiry.
pub fn decode_token(token: &str) -> Result<Claims, AuthServiceError> {
    let secret = jwt_secret()?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

/// Validates a token end-to-end: denylist (when Redis is configured),
/// signature, expiry, and type.
///
/// A configured-but-unreachable Redis is a hard failure: authentication must
/// not silently skip the revocation check.
pub async fn validate_token(
    token: &str,
    redis_client: Option<&redis::Client>,
) -> Result<Claims, AuthServiceError> {
    if let Some(client) = redis_client {
        if is_token_blocked(client, token).await? {
            return Err(AuthServiceError::Jwt(JwtError::Revoked {
                span: SpanTrace::capture(),
            }));
        }
    }

    let claims = decode_token(token)?;

    if claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(AuthServiceError::authentication("Expected an access token"));
    }

    Ok(claims)
}

/// Revokes a token by adding it to the Redis denylist until its original
/// expiration.
pub async fn revoke_token(
    token: &str,
    redis_client: &redis::Client,
) -> Result<(), AuthServiceError> {
    let claims = decode_token(token)?;

    let now = Utc::now().timestamp() as usize;
    let ttl = claims.exp.saturating_sub(now);

    if ttl > 0 {
        crate::config::redis::block_token(redis_client, token, ttl as u64).await?;
    } else {
        warn!("Token already expired, skipping denylist entry");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::init_test_env;

    #[test]
    fn round_trips_claims() {
        init_test_env();
        let token = generate_access_token(42, "alice", None).unwrap();
        let claims = decode_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_expired_token() {
        init_test_env();
        // Far enough in the past to clear any validation leeway.
        let token = generate_access_token(1, "alice", Some(Duration::seconds(-120))).unwrap();
        let err = decode_token(&token).unwrap_err();

        assert!(matches!(
            err,
            AuthServiceError::Jwt(JwtError::Expired { .. })
        ));
    }

    #[test]
    fn rejects_garbage_token() {
        init_test_env();
        assert!(decode_token("not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn validate_without_redis_skips_denylist() {
        init_test_env();
        let token = generate_access_token(7, "bob", None).unwrap();
        let claims = validate_token(&token, None).await.unwrap();
        assert_eq!(claims.sub, "7");
    }

    #[tokio::test]
    async fn validate_rejects_tampered_token() {
        init_test_env();
        let token = generate_access_token(7, "bob", None).unwrap();
        // Flip a character in the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(validate_token(&tampered, None).await.is_err());
    }
}
