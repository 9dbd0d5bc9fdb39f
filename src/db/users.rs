//! User records and credential verification.
//!
//! User lifecycle (registration, activation, deletion) is owned by an
//! external user-management subsystem; this service reads users to
//! authenticate them. The insert path exists for fixtures and tooling.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use diesel::prelude::*;
use diesel::{Insertable, PgConnection, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::schema::users;
use crate::utils::errors::AuthServiceError;

// =============================================================================
// DATA MODELS
// =============================================================================

/// User model mapping to the database schema.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// New user for database insertion.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

// =============================================================================
// SECURITY CONFIGURATION
// =============================================================================

const ARGON2_MEMORY_COST: u32 = 65536; // 64 MB
const ARGON2_TIME_COST: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_VERSION: Version = Version::V0x13;

// =============================================================================
// IMPLEMENTATION
// =============================================================================

impl User {
    /// Hashes a password using Argon2id.
    pub fn hash_password(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);

        let argon2 = Argon2::new_with_secret(
            &[],
            argon2::Algorithm::Argon2id,
            ARGON2_VERSION,
            Params::new(
                ARGON2_MEMORY_COST,
                ARGON2_TIME_COST,
                ARGON2_PARALLELISM,
                None,
            )
            .unwrap(),
        )
        .expect("Failed to create Argon2 instance");

        argon2
            .hash_password(password.as_bytes(), &salt)
            .expect("Password hashing failed")
            .to_string()
    }

    /// Creates a `NewUser` for database insertion.
    pub fn new_for_insert(username: &str, password: &str, active: bool) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: Self::hash_password(password),
            is_active: active,
        }
    }

    /// Verifies a password against the stored hash.
    pub fn verify_password(&self, password: &str) -> Result<bool, AuthServiceError> {
        let parsed_hash = PasswordHash::new(&self.password_hash).map_err(|e| {
            error!("Invalid password hash for user {}: {}", self.username, e);
            AuthServiceError::database("Stored password hash is malformed")
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Saves a new user to the database, returning the inserted row.
    pub fn save_new(new_user: NewUser, conn: &mut PgConnection) -> Result<User, AuthServiceError> {
        diesel::insert_into(users::table)
            .values(&new_user)
            .get_result::<User>(conn)
            .map_err(|e| {
                error!("Failed to save user {}: {}", new_user.username, e);
                AuthServiceError::from(e)
            })
    }

    /// Finds a user by username. A missing row is `Ok(None)`, not an error.
    pub fn find_by_username(
        conn: &mut PgConnection,
        username_str: &str,
    ) -> Result<Option<Self>, AuthServiceError> {
        use crate::db::schema::users::dsl::*;

        users
            .filter(username.eq(username_str))
            .first::<User>(conn)
            .optional()
            .map_err(AuthServiceError::from)
    }

    /// Finds a user by primary key.
    pub fn find_by_id(
        conn: &mut PgConnection,
        user_id: i32,
    ) -> Result<Option<Self>, AuthServiceError> {
        use crate::db::schema::users::dsl::*;

        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .optional()
            .map_err(AuthServiceError::from)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            password_hash: User::hash_password(password),
            is_active: true,
        }
    }

    #[test]
    fn password_hashing_and_verification() {
        let user = user_with_password("Secret123!");

        assert!(user.verify_password("Secret123!").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn password_hash_uniqueness() {
        let hash1 = User::hash_password("password");
        let hash2 = User::hash_password("password");

        // Different salts should produce different hashes.
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn verification_with_malformed_hash_is_an_error() {
        let mut user = user_with_password("Pass123!");
        user.password_hash = "invalid_hash".to_string();

        assert!(user.verify_password("Pass123!").is_err());
    }

    #[test]
    fn new_for_insert_hashes_the_password() {
        let new_user = User::new_for_insert("bob", "Pass123!", false);

        assert_eq!(new_user.username, "bob");
        assert!(!new_user.is_active);
        assert_ne!(new_user.password_hash, "Pass123!");
        assert!(new_user.password_hash.starts_with("$argon2id$"));
    }
}
