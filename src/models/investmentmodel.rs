use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on any single money field of a round.
pub const MAX_MONEY_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl InvestmentStatus {
    pub fn can_transition_to(&self, to: InvestmentStatus) -> bool {
        match (self, to) {
            (InvestmentStatus::Draft, InvestmentStatus::Active) => true,
            (InvestmentStatus::Draft, InvestmentStatus::Cancelled) => true,
            (InvestmentStatus::Active, InvestmentStatus::Completed) => true,
            (InvestmentStatus::Active, InvestmentStatus::Cancelled) => true,
            // a refund on a fully subscribed round reopens it
            (InvestmentStatus::Completed, InvestmentStatus::Active) => true,
            _ => false,
        }
    }
}

/// Funding round for one franchise.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Investment {
    pub id: Uuid,
    pub franchise_id: Uuid,
    pub version: i64,

    pub total_investment: i64,
    pub total_invested: i64,
    pub shares_issued: i64,
    pub shares_purchased: i64,
    pub share_price: i64,

    // Cost breakdown, sums to total_investment
    pub franchise_fee: i64,
    pub setup_cost: i64,
    pub working_capital: i64,

    // Per-investor caps
    pub minimum_investment: i64,
    pub maximum_investment: i64,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn shares_remaining(&self) -> i64 {
        self.shares_issued - self.shares_purchased
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.start_date.map_or(true, |start| now >= start);
        let not_ended = self.end_date.map_or(true, |end| now <= end);
        started && not_ended
    }

    pub fn funding_percentage(&self) -> f64 {
        if self.total_investment <= 0 {
            return 0.0;
        }
        (self.total_invested as f64 / self.total_investment as f64) * 100.0
    }

    pub fn ledger_is_consistent(&self) -> bool {
        self.shares_purchased >= 0
            && self.shares_purchased <= self.shares_issued
            && self.shares_issued.saturating_mul(self.share_price) <= self.total_investment
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Pending,
    Confirmed,
    Failed,
    Refunded,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Confirmed => "confirmed",
            ShareStatus::Failed => "failed",
            ShareStatus::Refunded => "refunded",
        }
    }
}

/// One share purchase.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FranchiseShare {
    pub id: Uuid,
    pub franchise_id: Uuid,
    pub investor_id: String, // wallet address
    pub shares_purchased: i64,
    pub share_price: i64,
    pub total_amount: i64,
    pub transaction_hash: Option<String>,
    pub status: ShareStatus,
    pub failure_reason: Option<String>,
    pub refund_reason: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvestmentProgress {
    pub franchise_id: Uuid,
    pub total_investment: i64,
    pub total_invested: i64,
    pub funding_percentage: f64,
    pub shares_issued: i64,
    pub shares_purchased: i64,
    pub shares_remaining: i64,
    pub investor_count: usize,
    pub status: InvestmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_transitions_follow_round_lifecycle() {
        assert!(InvestmentStatus::Draft.can_transition_to(InvestmentStatus::Active));
        assert!(InvestmentStatus::Active.can_transition_to(InvestmentStatus::Completed));
        assert!(InvestmentStatus::Completed.can_transition_to(InvestmentStatus::Active));
        assert!(!InvestmentStatus::Cancelled.can_transition_to(InvestmentStatus::Active));
        assert!(!InvestmentStatus::Draft.can_transition_to(InvestmentStatus::Completed));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let investment = Investment {
            id: Uuid::new_v4(),
            franchise_id: Uuid::new_v4(),
            version: 0,
            total_investment: 1_000,
            total_invested: 250,
            shares_issued: 10,
            shares_purchased: 2,
            share_price: 100,
            franchise_fee: 500,
            setup_cost: 300,
            working_capital: 200,
            minimum_investment: 100,
            maximum_investment: 500,
            start_date: Some(now),
            end_date: Some(now + Duration::days(1)),
            status: InvestmentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(investment.is_open_at(now));
        assert!(!investment.is_open_at(now - Duration::seconds(1)));
        assert!(!investment.is_open_at(now + Duration::days(2)));
        assert_eq!(investment.shares_remaining(), 8);
        assert_eq!(investment.funding_percentage(), 25.0);
        assert!(investment.ledger_is_consistent());
    }
}
