use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A franchise brand.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Franchiser {
    pub id: Uuid,
    pub name: String,
    pub industry: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FranchiseStatus {
    #[default]
    Pending,
    Active,
    Closed,
}

/// A single outlet of a franchise brand.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Franchise {
    pub id: Uuid,
    pub franchiser_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub status: FranchiseStatus,
    pub created_at: DateTime<Utc>,
}
