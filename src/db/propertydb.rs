use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::{DBClient, StoreError},
    models::propertymodel::{Property, PropertyStage},
};

pub const DEFAULT_PROPERTY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct PropertyFilter {
    pub stage: Option<PropertyStage>,
    pub assigned_to: Option<Uuid>,
    pub is_available: Option<bool>,
    pub is_verified: Option<bool>,
    pub limit: usize,
}

impl Default for PropertyFilter {
    fn default() -> Self {
        Self {
            stage: None,
            assigned_to: None,
            is_available: None,
            is_verified: None,
            limit: DEFAULT_PROPERTY_LIMIT,
        }
    }
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        self.stage.map_or(true, |s| property.stage == s)
            && self.assigned_to.map_or(true, |a| property.assigned_to == Some(a))
            && self.is_available.map_or(true, |a| property.is_available == a)
            && self.is_verified.map_or(true, |v| property.is_verified == v)
    }
}

#[async_trait]
pub trait PropertyExt {
    async fn insert_property(&self, property: &Property) -> Result<(), StoreError>;

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, StoreError>;

    /// Newest first.
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError>;

    /// Unfiltered scan used by statistics and search.
    async fn all_properties(&self) -> Result<Vec<Property>, StoreError>;

    /// Writes `property` if the stored version still equals `property.version`.
    /// Returns the stored record with its version bumped.
    async fn replace_property(&self, property: &Property) -> Result<Property, StoreError>;
}

#[async_trait]
impl PropertyExt for DBClient {
    async fn insert_property(&self, property: &Property) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO properties (id, version, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(property.id)
        .bind(property.version)
        .bind(Json(property))
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(property.id));
        }
        Ok(())
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Property>>(
            "SELECT doc FROM properties WHERE id = $1",
        )
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(property)| property))
    }

    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<Property>>(
            r#"
            SELECT doc FROM properties
            WHERE ($1::text IS NULL OR doc->>'stage' = $1)
              AND ($2::text IS NULL OR doc->>'assigned_to' = $2)
              AND ($3::boolean IS NULL OR (doc->>'is_available')::boolean = $3)
              AND ($4::boolean IS NULL OR (doc->>'is_verified')::boolean = $4)
            ORDER BY created_at DESC
            LIMIT $5
            "#,
        )
        .bind(filter.stage.map(|s| s.as_str()))
        .bind(filter.assigned_to.map(|a| a.to_string()))
        .bind(filter.is_available)
        .bind(filter.is_verified)
        .bind(filter.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(property)| property).collect())
    }

    async fn all_properties(&self) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<Property>>(
            "SELECT doc FROM properties ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("full property scan returned {} rows", rows.len());
        Ok(rows.into_iter().map(|Json(property)| property).collect())
    }

    async fn replace_property(&self, property: &Property) -> Result<Property, StoreError> {
        let mut stored = property.clone();
        stored.version = property.version + 1;

        let result = sqlx::query(
            r#"
            UPDATE properties
            SET doc = $1, version = $2, updated_at = $3
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(Json(&stored))
        .bind(stored.version)
        .bind(stored.updated_at)
        .bind(property.id)
        .bind(property.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.conflict_or_missing("properties", property.id).await);
        }
        Ok(stored)
    }
}
