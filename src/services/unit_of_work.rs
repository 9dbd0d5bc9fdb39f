//! Commit boundary over the database pool.

use async_trait::async_trait;
use diesel::RunQueryDsl;
use tracing::debug;

use crate::config::database::{get_connection, DbPool};
use crate::services::UnitOfWork;
use crate::utils::errors::AuthServiceError;

/// `UnitOfWork` over the PostgreSQL pool.
///
/// Diesel executes each statement in its own transaction, so there is no
/// deferred write set to flush here; `commit` closes the request's unit of
/// work with a connection probe, surfacing connectivity faults at the commit
/// point instead of silently reporting success. Stores that buffer writes
/// (the in-memory test double does) rely on this hook to publish them.
pub struct DieselUnitOfWork {
    pool: DbPool,
}

impl DieselUnitOfWork {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for DieselUnitOfWork {
    async fn commit(&self) -> Result<(), AuthServiceError> {
        let mut conn = get_connection(&self.pool)?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(AuthServiceError::from)?;

        debug!("Unit of work committed");
        Ok(())
    }
}
