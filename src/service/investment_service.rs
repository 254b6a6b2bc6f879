// service/investment_service.rs
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    dtos::investmentdtos::{ConfirmShareDto, CreateInvestmentDto, PurchaseSharesDto},
    models::investmentmodel::{
        FranchiseShare, Investment, InvestmentProgress, InvestmentStatus, ShareStatus,
    },
    service::{error::ServiceError, property_service::MAX_WRITE_ATTEMPTS},
};

fn out_of_range(what: &str) -> ServiceError {
    ServiceError::Validation(format!("{} exceeds the supported range", what))
}

#[derive(Clone)]
pub struct InvestmentService {
    db_client: Arc<dyn Store>,
}

impl fmt::Debug for InvestmentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvestmentService")
            .field("backend", &self.db_client.backend_tag())
            .finish()
    }
}

impl InvestmentService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    async fn load_round(&self, franchise_id: Uuid) -> Result<Investment, ServiceError> {
        self.db_client
            .get_investment_by_franchise(franchise_id)
            .await?
            .ok_or(ServiceError::InvestmentNotFound(franchise_id))
    }

    async fn load_share(&self, share_id: Uuid) -> Result<FranchiseShare, ServiceError> {
        self.db_client
            .get_share(share_id)
            .await?
            .ok_or(ServiceError::ShareNotFound(share_id))
    }

    /// Versioned read-modify-write on a round. The ledger invariant is
    /// checked before every write.
    async fn mutate_round<F>(&self, franchise_id: Uuid, mut apply: F) -> Result<Investment, ServiceError>
    where
        F: FnMut(&mut Investment) -> Result<(), ServiceError> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut round = self.load_round(franchise_id).await?;
            apply(&mut round)?;

            if !round.ledger_is_consistent() {
                return Err(ServiceError::Validation(format!(
                    "Ledger for franchise {} would become inconsistent",
                    franchise_id
                )));
            }
            round.updated_at = Utc::now();

            match self.db_client.replace_investment(&round).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::warn!(
                        "Investment for franchise {} changed during update (attempt {}/{}), retrying",
                        franchise_id,
                        attempt,
                        MAX_WRITE_ATTEMPTS
                    );
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(ServiceError::InvestmentNotFound(franchise_id))
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(franchise_id))
    }

    /// Moves a share from `expected` to the status carried by `share`. Losing
    /// the race to another writer reports the status that writer left.
    async fn swap_share_status(
        &self,
        share: &FranchiseShare,
        expected: ShareStatus,
    ) -> Result<(), ServiceError> {
        match self.db_client.update_share(share, expected).await {
            Ok(()) => Ok(()),
            Err(StoreError::VersionConflict { .. }) => {
                let current = self.load_share(share.id).await?;
                Err(ServiceError::InvalidShareStatus(share.id, current.status))
            }
            Err(StoreError::NotFound(_)) => Err(ServiceError::ShareNotFound(share.id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_investment(&self, body: CreateInvestmentDto) -> Result<Investment, ServiceError> {
        self.db_client
            .get_franchise(body.franchise_id)
            .await?
            .ok_or(ServiceError::FranchiseNotFound(body.franchise_id))?;

        let total_investment = body
            .franchise_fee
            .checked_add(body.setup_cost)
            .and_then(|sum| sum.checked_add(body.working_capital))
            .ok_or_else(|| out_of_range("Total investment"))?;
        let offered = body.shares_issued.saturating_mul(body.share_price);
        if offered > total_investment {
            return Err(ServiceError::Validation(format!(
                "Shares on offer ({}) exceed the total investment ({})",
                offered, total_investment
            )));
        }

        let now = Utc::now();
        let investment = Investment {
            id: Uuid::new_v4(),
            franchise_id: body.franchise_id,
            version: 0,
            total_investment,
            total_invested: 0,
            shares_issued: body.shares_issued,
            shares_purchased: 0,
            share_price: body.share_price,
            franchise_fee: body.franchise_fee,
            setup_cost: body.setup_cost,
            working_capital: body.working_capital,
            minimum_investment: body.minimum_investment,
            maximum_investment: body.maximum_investment,
            start_date: body.start_date,
            end_date: body.end_date,
            status: InvestmentStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        match self.db_client.insert_investment(&investment).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                return Err(ServiceError::InvestmentExists(body.franchise_id))
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            "Investment round {} opened for franchise {}: {} shares at {}",
            investment.id,
            investment.franchise_id,
            investment.shares_issued,
            investment.share_price
        );
        Ok(investment)
    }

    pub async fn get_investment(&self, franchise_id: Uuid) -> Result<Investment, ServiceError> {
        self.load_round(franchise_id).await
    }

    pub async fn update_investment_status(
        &self,
        franchise_id: Uuid,
        status: InvestmentStatus,
    ) -> Result<Investment, ServiceError> {
        let investment = self
            .mutate_round(franchise_id, |round| {
                if !round.status.can_transition_to(status) {
                    return Err(ServiceError::InvalidInvestmentTransition {
                        from: round.status,
                        to: status,
                    });
                }
                round.status = status;
                Ok(())
            })
            .await?;

        tracing::info!("Investment for franchise {} is now {:?}", franchise_id, status);
        Ok(investment)
    }

    pub async fn purchase_shares(
        &self,
        franchise_id: Uuid,
        body: PurchaseSharesDto,
    ) -> Result<FranchiseShare, ServiceError> {
        let round = self.load_round(franchise_id).await?;
        let now = Utc::now();

        if round.status != InvestmentStatus::Active {
            return Err(ServiceError::Validation(format!(
                "Investment round is {:?}, not open for purchases",
                round.status
            )));
        }
        if !round.is_open_at(now) {
            return Err(ServiceError::Validation(
                "Investment window is closed".to_string(),
            ));
        }
        if body.shares <= 0 {
            return Err(ServiceError::Validation(
                "At least one share must be purchased".to_string(),
            ));
        }
        if body.shares > round.shares_remaining() {
            return Err(ServiceError::InsufficientShares {
                requested: body.shares,
                available: round.shares_remaining(),
            });
        }

        let amount = body
            .shares
            .checked_mul(round.share_price)
            .ok_or_else(|| out_of_range("Purchase amount"))?;
        if amount < round.minimum_investment {
            return Err(ServiceError::Validation(format!(
                "Minimum investment is {}, got {}",
                round.minimum_investment, amount
            )));
        }

        let committed = self
            .db_client
            .list_shares_by_franchise(franchise_id)
            .await?
            .iter()
            .filter(|s| s.investor_id == body.investor_id)
            .filter(|s| matches!(s.status, ShareStatus::Pending | ShareStatus::Confirmed))
            .try_fold(0i64, |sum, s| sum.checked_add(s.total_amount))
            .ok_or_else(|| out_of_range("Committed amount"))?;
        let after_purchase = committed
            .checked_add(amount)
            .ok_or_else(|| out_of_range("Committed amount"))?;
        if after_purchase > round.maximum_investment {
            return Err(ServiceError::Validation(format!(
                "Maximum investment per investor is {}, already committed {}",
                round.maximum_investment, committed
            )));
        }

        let share = FranchiseShare {
            id: Uuid::new_v4(),
            franchise_id,
            investor_id: body.investor_id,
            shares_purchased: body.shares,
            share_price: round.share_price,
            total_amount: amount,
            transaction_hash: body.transaction_hash,
            status: ShareStatus::Pending,
            failure_reason: None,
            refund_reason: None,
            confirmed_at: None,
            refunded_at: None,
            created_at: now,
        };
        self.db_client.insert_share(&share).await?;

        tracing::info!(
            "Investor {} reserved {} shares of franchise {} ({})",
            share.investor_id,
            share.shares_purchased,
            franchise_id,
            share.id
        );
        Ok(share)
    }

    /// Pending to confirmed. The share is claimed first so two confirmations
    /// cannot both reach the ledger; a ledger failure hands it back.
    pub async fn confirm_share(
        &self,
        share_id: Uuid,
        body: ConfirmShareDto,
    ) -> Result<(FranchiseShare, Investment), ServiceError> {
        let pending = self.load_share(share_id).await?;
        if pending.status != ShareStatus::Pending {
            return Err(ServiceError::InvalidShareStatus(share_id, pending.status));
        }

        let mut confirmed = pending.clone();
        confirmed.status = ShareStatus::Confirmed;
        confirmed.confirmed_at = Some(Utc::now());
        if body.transaction_hash.is_some() {
            confirmed.transaction_hash = body.transaction_hash;
        }
        self.swap_share_status(&confirmed, ShareStatus::Pending).await?;

        let ledger = self
            .mutate_round(confirmed.franchise_id, |round| {
                if round.status != InvestmentStatus::Active {
                    return Err(ServiceError::Validation(format!(
                        "Investment round is {:?}, cannot confirm purchases",
                        round.status
                    )));
                }
                if confirmed.shares_purchased > round.shares_remaining() {
                    return Err(ServiceError::InsufficientShares {
                        requested: confirmed.shares_purchased,
                        available: round.shares_remaining(),
                    });
                }
                round.total_invested = round
                    .total_invested
                    .checked_add(confirmed.total_amount)
                    .ok_or_else(|| out_of_range("Total invested"))?;
                round.shares_purchased += confirmed.shares_purchased;
                if round.shares_remaining() == 0 {
                    round.status = InvestmentStatus::Completed;
                }
                Ok(())
            })
            .await;

        match ledger {
            Ok(investment) => {
                tracing::info!(
                    "Share {} confirmed, franchise {} now {:.2}% funded",
                    share_id,
                    investment.franchise_id,
                    investment.funding_percentage()
                );
                Ok((confirmed, investment))
            }
            Err(e) => {
                tracing::warn!("Ledger update for share {} failed, releasing it: {}", share_id, e);
                if let Err(rollback) = self.db_client.update_share(&pending, ShareStatus::Confirmed).await {
                    tracing::error!("Could not release share {}: {}", share_id, rollback);
                }
                Err(e)
            }
        }
    }

    pub async fn fail_share(&self, share_id: Uuid, reason: String) -> Result<FranchiseShare, ServiceError> {
        let mut share = self.load_share(share_id).await?;
        if share.status != ShareStatus::Pending {
            return Err(ServiceError::InvalidShareStatus(share_id, share.status));
        }

        share.status = ShareStatus::Failed;
        share.failure_reason = Some(reason);
        self.swap_share_status(&share, ShareStatus::Pending).await?;

        tracing::warn!("Share purchase {} failed", share_id);
        Ok(share)
    }

    /// Confirmed to refunded. Reverses the ledger and reopens a completed round.
    pub async fn refund_share(
        &self,
        share_id: Uuid,
        reason: String,
    ) -> Result<(FranchiseShare, Investment), ServiceError> {
        let confirmed = self.load_share(share_id).await?;
        if confirmed.status != ShareStatus::Confirmed {
            return Err(ServiceError::InvalidShareStatus(share_id, confirmed.status));
        }

        let mut refunded = confirmed.clone();
        refunded.status = ShareStatus::Refunded;
        refunded.refund_reason = Some(reason);
        refunded.refunded_at = Some(Utc::now());
        self.swap_share_status(&refunded, ShareStatus::Confirmed).await?;

        let ledger = self
            .mutate_round(refunded.franchise_id, |round| {
                round.total_invested = round
                    .total_invested
                    .checked_sub(refunded.total_amount)
                    .ok_or_else(|| out_of_range("Total invested"))?;
                round.shares_purchased -= refunded.shares_purchased;
                if round.status == InvestmentStatus::Completed {
                    round.status = InvestmentStatus::Active;
                }
                Ok(())
            })
            .await;

        match ledger {
            Ok(investment) => {
                tracing::info!(
                    "Share {} refunded, {} shares back on offer for franchise {}",
                    share_id,
                    refunded.shares_purchased,
                    investment.franchise_id
                );
                Ok((refunded, investment))
            }
            Err(e) => {
                if let Err(rollback) = self.db_client.update_share(&confirmed, ShareStatus::Refunded).await {
                    tracing::error!("Could not restore share {}: {}", share_id, rollback);
                }
                Err(e)
            }
        }
    }

    pub async fn get_investment_progress(
        &self,
        franchise_id: Uuid,
    ) -> Result<InvestmentProgress, ServiceError> {
        let round = self.load_round(franchise_id).await?;
        let shares = self.db_client.list_shares_by_franchise(franchise_id).await?;
        let investors: HashSet<&str> = shares
            .iter()
            .filter(|s| s.status == ShareStatus::Confirmed)
            .map(|s| s.investor_id.as_str())
            .collect();

        Ok(InvestmentProgress {
            franchise_id,
            total_investment: round.total_investment,
            total_invested: round.total_invested,
            funding_percentage: round.funding_percentage(),
            shares_issued: round.shares_issued,
            shares_purchased: round.shares_purchased,
            shares_remaining: round.shares_remaining(),
            investor_count: investors.len(),
            status: round.status,
        })
    }

    pub async fn list_shares_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Vec<FranchiseShare>, ServiceError> {
        self.load_round(franchise_id).await?;
        Ok(self.db_client.list_shares_by_franchise(franchise_id).await?)
    }

    pub async fn list_shares_by_investor(
        &self,
        investor_id: &str,
    ) -> Result<Vec<FranchiseShare>, ServiceError> {
        Ok(self.db_client.list_shares_by_investor(investor_id).await?)
    }
}
