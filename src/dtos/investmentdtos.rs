use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::investmentmodel::InvestmentStatus;

pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    // base58 alphabet, 32-44 chars
    let wallet_regex = regex::Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$")
        .map_err(|_| ValidationError::new("Invalid wallet regex"))?;

    if !wallet_regex.is_match(address) {
        let mut error = ValidationError::new("invalid_wallet_address");
        error.message = Some(Cow::from("Investor id must be a base58 wallet address"));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_round_shape", skip_on_field_errors = false))]
pub struct CreateInvestmentDto {
    pub franchise_id: Uuid,

    #[validate(range(min = 0, max = 1000000000000, message = "Franchise fee must be between 0 and 1000000000000"))]
    pub franchise_fee: i64,
    #[validate(range(min = 0, max = 1000000000000, message = "Setup cost must be between 0 and 1000000000000"))]
    pub setup_cost: i64,
    #[validate(range(min = 0, max = 1000000000000, message = "Working capital must be between 0 and 1000000000000"))]
    pub working_capital: i64,

    #[validate(range(min = 1, max = 1000000000000, message = "Shares issued must be between 1 and 1000000000000"))]
    pub shares_issued: i64,
    #[validate(range(min = 1, max = 1000000000000, message = "Share price must be between 1 and 1000000000000"))]
    pub share_price: i64,

    #[validate(range(min = 1, max = 1000000000000, message = "Minimum investment must be between 1 and 1000000000000"))]
    pub minimum_investment: i64,
    #[validate(range(min = 1, max = 1000000000000, message = "Maximum investment must be between 1 and 1000000000000"))]
    pub maximum_investment: i64,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn validate_round_shape(dto: &CreateInvestmentDto) -> Result<(), ValidationError> {
    if dto.minimum_investment > dto.maximum_investment {
        let mut error = ValidationError::new("investment_caps");
        error.message = Some(Cow::from("Minimum investment cannot exceed maximum investment"));
        return Err(error);
    }
    if let (Some(start), Some(end)) = (dto.start_date, dto.end_date) {
        if start >= end {
            let mut error = ValidationError::new("investment_window");
            error.message = Some(Cow::from("Start date must be before end date"));
            return Err(error);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateInvestmentStatusDto {
    pub status: InvestmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseSharesDto {
    #[validate(custom = "validate_wallet_address")]
    pub investor_id: String,
    #[validate(range(min = 1, max = 1000000000000, message = "At least one share must be purchased"))]
    pub shares: i64,
    #[validate(length(min = 1, max = 128))]
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConfirmShareDto {
    #[validate(length(min = 1, max = 128))]
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShareReasonDto {
    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
}
