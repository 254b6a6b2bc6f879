use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::{ErrorMessage, HttpError},
    models::{
        investmentmodel::{InvestmentStatus, ShareStatus},
        propertymodel::PenaltyTotalsOverflow,
    },
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Property not found")]
    PropertyNotFound(Uuid),

    #[error("Penalty not found")]
    PenaltyNotFound,

    #[error("Franchise {0} not found")]
    FranchiseNotFound(Uuid),

    #[error("Franchiser {0} not found")]
    FranchiserNotFound(Uuid),

    #[error("No investment round for franchise {0}")]
    InvestmentNotFound(Uuid),

    #[error("Share purchase {0} not found")]
    ShareNotFound(Uuid),

    #[error("Investment round for franchise {0} already exists")]
    InvestmentExists(Uuid),

    #[error("Cannot move investment from {from:?} to {to:?}")]
    InvalidInvestmentTransition { from: InvestmentStatus, to: InvestmentStatus },

    #[error("Share purchase {0} is {1:?}")]
    InvalidShareStatus(Uuid, ShareStatus),

    #[error("Only {available} shares left, requested {requested}")]
    InsufficientShares { requested: i64, available: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record {0} is being updated concurrently, try again")]
    Conflict(Uuid),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::PropertyNotFound(_)
            | ServiceError::PenaltyNotFound
            | ServiceError::FranchiseNotFound(_)
            | ServiceError::FranchiserNotFound(_)
            | ServiceError::InvestmentNotFound(_)
            | ServiceError::ShareNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidInvestmentTransition { .. }
            | ServiceError::InvalidShareStatus(_, _)
            | ServiceError::InsufficientShares { .. }
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::InvestmentExists(_) | ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Rpc(_) => StatusCode::BAD_GATEWAY,

            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PenaltyTotalsOverflow> for ServiceError {
    fn from(error: PenaltyTotalsOverflow) -> Self {
        ServiceError::Validation(error.to_string())
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            // store internals stay in the logs
            ServiceError::Store(ref e) => {
                tracing::error!("store failure: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}
