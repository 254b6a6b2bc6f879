pub mod franchisedb;
pub mod investmentdb;
pub mod memory;
pub mod propertydb;

use sqlx::{Pool, Postgres};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{franchisedb::FranchiseExt, investmentdb::InvestmentExt, propertydb::PropertyExt};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Record {id} was modified concurrently")]
    VersionConflict { id: Uuid },

    #[error("Record {0} already exists")]
    AlreadyExists(Uuid),

    #[error("Record {0} not found")]
    NotFound(Uuid),
}

/// Everything the services need from a backend.
pub trait Store: PropertyExt + FranchiseExt + InvestmentExt + Send + Sync {
    fn backend_tag(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Tells a lost optimistic write apart from a missing row.
    async fn conflict_or_missing(&self, table: &str, id: Uuid) -> StoreError {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table);
        match sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
        {
            Ok(true) => StoreError::VersionConflict { id },
            Ok(false) => StoreError::NotFound(id),
            Err(e) => StoreError::Database(e),
        }
    }
}

impl Store for DBClient {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }
}
