//! Redis connection and access-token denylist.
//!
//! Redis is an optional dependency: when configured it backs the denylist
//! that makes logout take effect for outstanding access tokens before they
//! expire. Refresh tokens never pass through here; they live in the
//! database-backed token store.

use redis::{AsyncCommands, Client};
use std::env;
use tracing::{debug, error, info};
use tracing_error::SpanTrace;

use crate::utils::errors::CacheError;

/// Environment variable name for the Redis URL.
const REDIS_URL_ENV: &str = "REDIS_URL";

/// Key prefix for denylisted access tokens.
const REVOKED_KEY_PREFIX: &str = "jwt:revoked:";

/// Value stored to mark a token as revoked.
const TOKEN_BLOCKED_VALUE: &str = "blocked";

/// Initializes the Redis client using the `REDIS_URL` environment variable.
pub fn init_redis() -> Result<Client, CacheError> {
    let redis_url = env::var(REDIS_URL_ENV).map_err(|e| CacheError::Connection {
        source: Box::new(e),
        span: SpanTrace::capture(),
    })?;

    let client = Client::open(redis_url).map_err(|e| {
        error!("Invalid Redis URL: {}", e);
        CacheError::Connection {
            source: Box::new(e),
            span: SpanTrace::capture(),
        }
    })?;

    debug!("Redis client initialized");
    Ok(client)
}

/// Checks the Redis connection by sending a PING command.
///
/// Returns true only if the server replies with PONG.
pub async fn check_redis_connection(redis_client: &Client) -> bool {
    let mut con = match redis_client.get_async_connection().await {
        Ok(con) => con,
        Err(e) => {
            error!("Failed to connect to Redis: {}", e);
            return false;
        }
    };

    match redis::cmd("PING").query_async::<_, String>(&mut con).await {
        Ok(resp) if resp == "PONG" => {
            info!("Redis connection check successful");
            true
        }
        Ok(unexpected) => {
            error!("Unexpected PING response: {}", unexpected);
            false
        }
        Err(e) => {
            error!("PING command failed: {}", e);
            false
        }
    }
}

fn revoked_key(token: &str) -> String {
    format!("{}{}", REVOKED_KEY_PREFIX, token)
}

/// Adds a token to the denylist with the given TTL in seconds.
pub async fn block_token(
    client: &Client,
    token: &str,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let mut con = client
        .get_async_connection()
        .await
        .map_err(|e| CacheError::Connection {
            source: Box::new(e),
            span: SpanTrace::capture(),
        })?;

    con.set_ex::<_, _, ()>(revoked_key(token), TOKEN_BLOCKED_VALUE, ttl_secs as usize)
        .await
        .map_err(CacheError::from)?;

    debug!("Token added to denylist (ttl={}s)", ttl_secs);
    Ok(())
}

/// Checks whether a token is on the denylist.
pub async fn is_token_blocked(client: &Client, token: &str) -> Result<bool, CacheError> {
    let mut con = client
        .get_async_connection()
        .await
        .map_err(|e| CacheError::Connection {
            source: Box::new(e),
            span: SpanTrace::capture(),
        })?;

    let blocked: bool = con
        .exists(revoked_key(token))
        .await
        .map_err(CacheError::from)?;

    Ok(blocked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoked_key_uses_prefix() {
        assert_eq!(revoked_key("abc"), "jwt:revoked:abc");
    }

    #[tokio::test]
    #[ignore] // requires a running Redis at TEST_REDIS_URL
    async fn block_and_check_round_trip() {
        let url = env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let client = Client::open(url).unwrap();

        block_token(&client, "round-trip-token", 30).await.unwrap();
        assert!(is_token_blocked(&client, "round-trip-token").await.unwrap());
        assert!(!is_token_blocked(&client, "other-token").await.unwrap());
    }
}
