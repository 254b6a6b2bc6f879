use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::{DBClient, StoreError},
    models::franchisemodel::{Franchise, Franchiser},
};

#[async_trait]
pub trait FranchiseExt {
    async fn insert_franchiser(&self, franchiser: &Franchiser) -> Result<(), StoreError>;

    async fn get_franchiser(&self, franchiser_id: Uuid) -> Result<Option<Franchiser>, StoreError>;

    async fn insert_franchise(&self, franchise: &Franchise) -> Result<(), StoreError>;

    async fn get_franchise(&self, franchise_id: Uuid) -> Result<Option<Franchise>, StoreError>;
}

#[async_trait]
impl FranchiseExt for DBClient {
    async fn insert_franchiser(&self, franchiser: &Franchiser) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO franchisers (id, doc, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(franchiser.id)
        .bind(Json(franchiser))
        .bind(franchiser.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(franchiser.id));
        }
        Ok(())
    }

    async fn get_franchiser(&self, franchiser_id: Uuid) -> Result<Option<Franchiser>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Franchiser>>(
            "SELECT doc FROM franchisers WHERE id = $1",
        )
        .bind(franchiser_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(franchiser)| franchiser))
    }

    async fn insert_franchise(&self, franchise: &Franchise) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO franchises (id, franchiser_id, doc, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(franchise.id)
        .bind(franchise.franchiser_id)
        .bind(Json(franchise))
        .bind(franchise.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(franchise.id));
        }
        Ok(())
    }

    async fn get_franchise(&self, franchise_id: Uuid) -> Result<Option<Franchise>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Franchise>>(
            "SELECT doc FROM franchises WHERE id = $1",
        )
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(franchise)| franchise))
    }
}
