//! Diesel-backed credential authentication.

use async_trait::async_trait;
use tracing::debug;

use crate::config::database::{get_connection, DbPool};
use crate::db::users::User;
use crate::services::UsersService;
use crate::utils::errors::AuthServiceError;

/// `UsersService` over the PostgreSQL user table with Argon2id verification.
pub struct DieselUsersService {
    pool: DbPool,
}

impl DieselUsersService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersService for DieselUsersService {
    async fn find_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthServiceError> {
        let mut conn = get_connection(&self.pool)?;

        let user = match User::find_by_username(&mut conn, username)? {
            Some(user) => user,
            None => {
                debug!("Credential check: unknown username");
                return Ok(None);
            }
        };

        if user.verify_password(password)? {
            Ok(Some(user))
        } else {
            debug!("Credential check: password mismatch");
            Ok(None)
        }
    }
}
