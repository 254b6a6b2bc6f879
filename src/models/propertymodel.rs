use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Largest single penalty the API accepts.
pub const MAX_PENALTY_AMOUNT: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Penalty totals exceed the supported range")]
pub struct PenaltyTotalsOverflow;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStage {
    Listing,
    Requested,
    Blocked,
    Rented,
    Sold,
}

impl PropertyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStage::Listing => "listing",
            PropertyStage::Requested => "requested",
            PropertyStage::Blocked => "blocked",
            PropertyStage::Rented => "rented",
            PropertyStage::Sold => "sold",
        }
    }

    /// Rented or sold properties must not be advertised as available.
    pub fn is_occupied(&self) -> bool {
        matches!(self, PropertyStage::Rented | PropertyStage::Sold)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Commercial,
    Retail,
    Office,
    Warehouse,
    MixedUse,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Call,
    Email,
    Meeting,
    Inspection,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    LateUpdate,
    FalseAvailability,
    ContractBreach,
    Misinformation,
}

impl PenaltyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyType::LateUpdate => "late_update",
            PenaltyType::FalseAvailability => "false_availability",
            PenaltyType::ContractBreach => "contract_breach",
            PenaltyType::Misinformation => "misinformation",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyStatus {
    Pending,
    Paid,
    Waived,
    Disputed,
}

impl PenaltyStatus {
    /// Pending and disputed penalties still count as owed.
    pub fn is_unpaid(&self) -> bool {
        matches!(self, PenaltyStatus::Pending | PenaltyStatus::Disputed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyStatus::Pending => "pending",
            PenaltyStatus::Paid => "paid",
            PenaltyStatus::Waived => "waived",
            PenaltyStatus::Disputed => "disputed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LandlordContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContactEntry {
    pub date: DateTime<Utc>,
    pub contact_type: ContactType,
    pub notes: String,
    pub contacted_by: Uuid,
    pub outcome: Option<String>,
}

impl ContactEntry {
    pub fn new(
        date: DateTime<Utc>,
        contact_type: ContactType,
        notes: impl Into<String>,
        contacted_by: Uuid,
        outcome: Option<String>,
    ) -> Self {
        Self {
            date,
            contact_type,
            notes: notes.into(),
            contacted_by,
            outcome,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PenaltyEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub penalty_type: PenaltyType,
    pub amount: i64,
    pub reason: String,
    pub imposed_by: Uuid,
    pub status: PenaltyStatus,
    pub notes: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PenaltyEntry {
    pub fn pending(
        date: DateTime<Utc>,
        penalty_type: PenaltyType,
        amount: i64,
        reason: impl Into<String>,
        imposed_by: Uuid,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            penalty_type,
            amount,
            reason: reason.into(),
            imposed_by,
            status: PenaltyStatus::Pending,
            notes,
            updated_by: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Property {
    pub id: Uuid,
    pub version: i64,

    // Listing details
    pub address: String,
    pub coordinates: Coordinates,
    pub building_name: String,
    pub door_number: String,
    pub sqft: f64,
    pub cost_per_sqft: f64,
    pub property_type: PropertyType,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub landlord_contact: LandlordContact,
    pub priority: Priority,
    pub assigned_to: Option<Uuid>,

    // Set once matched to a franchise
    pub franchise_id: Option<Uuid>,
    pub franchiser_id: Option<Uuid>,

    // Verification
    pub is_verified: bool,
    pub verification_notes: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,

    pub stage: PropertyStage,
    pub is_available: bool,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,

    // Blockage contract
    pub fundraising_start_date: Option<DateTime<Utc>>,
    pub blockage_period: Option<i64>, // days

    // Append-only logs, insertion order
    pub contact_history: Vec<ContactEntry>,
    pub penalty_history: Vec<PenaltyEntry>,

    pub total_penalties: i64,
    pub unpaid_penalties: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Rewrites both penalty rollups from the log. Every change to
    /// `penalty_history` goes through here. On overflow both rollups are
    /// left as they were.
    pub fn recompute_penalty_totals(&mut self) -> Result<(), PenaltyTotalsOverflow> {
        let (total, unpaid) = self
            .penalty_history
            .iter()
            .try_fold((0i64, 0i64), |(total, unpaid), p| {
                let total = total.checked_add(p.amount)?;
                let unpaid = if p.status.is_unpaid() {
                    unpaid.checked_add(p.amount)?
                } else {
                    unpaid
                };
                Some((total, unpaid))
            })
            .ok_or(PenaltyTotalsOverflow)?;

        self.total_penalties = total;
        self.unpaid_penalties = unpaid;
        Ok(())
    }

    /// Appends to the log unless the rollups would overflow.
    pub fn push_penalty(&mut self, penalty: PenaltyEntry) -> Result<(), PenaltyTotalsOverflow> {
        self.penalty_history.push(penalty);
        if let Err(e) = self.recompute_penalty_totals() {
            self.penalty_history.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn push_contact(&mut self, entry: ContactEntry) {
        self.contact_history.push(entry);
    }

    pub fn find_penalty_mut(
        &mut self,
        penalty_id: Option<Uuid>,
        penalty_date: Option<DateTime<Utc>>,
    ) -> Option<&mut PenaltyEntry> {
        match (penalty_id, penalty_date) {
            (Some(id), _) => self.penalty_history.iter_mut().find(|p| p.id == id),
            (None, Some(date)) => self.penalty_history.iter_mut().find(|p| p.date == date),
            (None, None) => None,
        }
    }

    pub fn matches_search(&self, needle_lowercase: &str) -> bool {
        self.address.to_lowercase().contains(needle_lowercase)
            || self.building_name.to_lowercase().contains(needle_lowercase)
            || self.landlord_contact.name.to_lowercase().contains(needle_lowercase)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_counts_pending_and_disputed_as_unpaid() {
        let mut property = fixtures::property("12 MG Road");
        let actor = Uuid::new_v4();
        let now = Utc::now();
        for (status, amount) in [
            (PenaltyStatus::Pending, 100),
            (PenaltyStatus::Paid, 200),
            (PenaltyStatus::Waived, 400),
            (PenaltyStatus::Disputed, 800),
        ] {
            let mut entry = PenaltyEntry::pending(now, PenaltyType::Misinformation, amount, "r", actor, None);
            entry.status = status;
            property.penalty_history.push(entry);
        }
        property.total_penalties = -5;
        property.unpaid_penalties = 99_999;

        property.recompute_penalty_totals().unwrap();

        assert_eq!(property.total_penalties, 1500);
        assert_eq!(property.unpaid_penalties, 900);
    }

    #[test]
    fn penalty_lookup_prefers_id_over_date() {
        let mut property = fixtures::property("12 MG Road");
        let now = Utc::now();
        let actor = Uuid::new_v4();
        let first = PenaltyEntry::pending(now, PenaltyType::LateUpdate, 100, "a", actor, None);
        let second = PenaltyEntry::pending(now, PenaltyType::FalseAvailability, 500, "b", actor, None);
        let second_id = second.id;
        property.push_penalty(first).unwrap();
        property.push_penalty(second).unwrap();

        let by_id = property.find_penalty_mut(Some(second_id), Some(now)).map(|p| p.amount);
        assert_eq!(by_id, Some(500));

        // Same timestamp: the date lookup resolves to the first entry.
        let by_date = property.find_penalty_mut(None, Some(now)).map(|p| p.amount);
        assert_eq!(by_date, Some(100));

        assert!(property.find_penalty_mut(None, None).is_none());
    }

    #[test]
    fn overflowing_penalty_is_rejected_and_totals_kept() {
        let mut property = fixtures::property("12 MG Road");
        let actor = Uuid::new_v4();
        let now = Utc::now();
        property
            .push_penalty(PenaltyEntry::pending(now, PenaltyType::Misinformation, i64::MAX, "a", actor, None))
            .unwrap();

        let err = property
            .push_penalty(PenaltyEntry::pending(now, PenaltyType::Misinformation, i64::MAX, "b", actor, None))
            .unwrap_err();

        assert_eq!(err, PenaltyTotalsOverflow);
        assert_eq!(property.penalty_history.len(), 1);
        assert_eq!(property.total_penalties, i64::MAX);
        assert_eq!(property.unpaid_penalties, i64::MAX);
    }

    #[test]
    fn search_is_case_insensitive_across_three_fields() {
        let property = fixtures::property("12 MG Road, Bengaluru");
        assert!(property.matches_search("mg road"));
        assert!(property.matches_search("prestige"));
        assert!(property.matches_search("asha"));
        assert!(!property.matches_search("koramangala"));
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&PropertyType::MixedUse).unwrap(), "\"mixed_use\"");
        assert_eq!(serde_json::to_string(&PenaltyType::FalseAvailability).unwrap(), "\"false_availability\"");
        assert_eq!(PropertyStage::Sold.as_str(), "sold");
    }
}
