use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::{DBClient, StoreError},
    models::investmentmodel::{FranchiseShare, Investment, ShareStatus},
};

#[async_trait]
pub trait InvestmentExt {
    /// One funding round per franchise; a second insert is `AlreadyExists`.
    async fn insert_investment(&self, investment: &Investment) -> Result<(), StoreError>;

    async fn get_investment_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Option<Investment>, StoreError>;

    /// Versioned write, same contract as `PropertyExt::replace_property`.
    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, StoreError>;

    async fn insert_share(&self, share: &FranchiseShare) -> Result<(), StoreError>;

    async fn get_share(&self, share_id: Uuid) -> Result<Option<FranchiseShare>, StoreError>;

    /// Writes `share` only while the stored status is still `expected`.
    async fn update_share(
        &self,
        share: &FranchiseShare,
        expected: ShareStatus,
    ) -> Result<(), StoreError>;

    async fn list_shares_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Vec<FranchiseShare>, StoreError>;

    async fn list_shares_by_investor(
        &self,
        investor_id: &str,
    ) -> Result<Vec<FranchiseShare>, StoreError>;
}

#[async_trait]
impl InvestmentExt for DBClient {
    async fn insert_investment(&self, investment: &Investment) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO investments (id, franchise_id, version, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(investment.id)
        .bind(investment.franchise_id)
        .bind(investment.version)
        .bind(Json(investment))
        .bind(investment.created_at)
        .bind(investment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(investment.franchise_id));
        }
        Ok(())
    }

    async fn get_investment_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Option<Investment>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Investment>>(
            "SELECT doc FROM investments WHERE franchise_id = $1",
        )
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(investment)| investment))
    }

    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, StoreError> {
        let mut stored = investment.clone();
        stored.version = investment.version + 1;

        let result = sqlx::query(
            r#"
            UPDATE investments
            SET doc = $1, version = $2, updated_at = $3
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(Json(&stored))
        .bind(stored.version)
        .bind(stored.updated_at)
        .bind(investment.id)
        .bind(investment.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.conflict_or_missing("investments", investment.id).await);
        }
        Ok(stored)
    }

    async fn insert_share(&self, share: &FranchiseShare) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO franchise_shares (id, franchise_id, investor_id, status, doc, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(share.id)
        .bind(share.franchise_id)
        .bind(&share.investor_id)
        .bind(share.status.as_str())
        .bind(Json(share))
        .bind(share.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(share.id));
        }
        Ok(())
    }

    async fn get_share(&self, share_id: Uuid) -> Result<Option<FranchiseShare>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<FranchiseShare>>(
            "SELECT doc FROM franchise_shares WHERE id = $1",
        )
        .bind(share_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(share)| share))
    }

    async fn update_share(
        &self,
        share: &FranchiseShare,
        expected: ShareStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE franchise_shares
            SET doc = $1, status = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(Json(share))
        .bind(share.status.as_str())
        .bind(share.id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.conflict_or_missing("franchise_shares", share.id).await);
        }
        Ok(())
    }

    async fn list_shares_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Vec<FranchiseShare>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<FranchiseShare>>(
            "SELECT doc FROM franchise_shares WHERE franchise_id = $1 ORDER BY created_at ASC",
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(share)| share).collect())
    }

    async fn list_shares_by_investor(
        &self,
        investor_id: &str,
    ) -> Result<Vec<FranchiseShare>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<FranchiseShare>>(
            "SELECT doc FROM franchise_shares WHERE investor_id = $1 ORDER BY created_at ASC",
        )
        .bind(investor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(share)| share).collect())
    }
}
