// service/penalty_engine.rs
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::propertymodel::{
    ContactEntry, ContactType, PenaltyEntry, PenaltyTotalsOverflow, PenaltyType, Property,
    PropertyStage,
};

pub const LATE_UPDATE_THRESHOLD_DAYS: i64 = 7;
pub const LATE_UPDATE_PENALTY: i64 = 100;
pub const FALSE_AVAILABILITY_PENALTY: i64 = 500;
pub const CONTRACT_BREACH_PENALTY: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub penalty_type: PenaltyType,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationReport {
    pub violations_found: usize,
    pub penalties_imposed: usize,
    pub violations: Vec<String>,
}

impl ViolationReport {
    pub fn empty() -> Self {
        Self {
            violations_found: 0,
            penalties_imposed: 0,
            violations: Vec::new(),
        }
    }
}

/// Runs the three rules independently against the current record.
pub fn evaluate_violations(property: &Property, now: DateTime<Utc>) -> Vec<Violation> {
    let mut violations = Vec::new();

    if property.is_available
        && property.stage == PropertyStage::Listing
        && now - property.updated_at > Duration::days(LATE_UPDATE_THRESHOLD_DAYS)
    {
        violations.push(Violation {
            penalty_type: PenaltyType::LateUpdate,
            amount: LATE_UPDATE_PENALTY,
            description: format!(
                "Listing not updated for more than {} days (last update {})",
                LATE_UPDATE_THRESHOLD_DAYS,
                property.updated_at.to_rfc3339()
            ),
        });
    }

    if property.is_available && property.stage.is_occupied() {
        violations.push(Violation {
            penalty_type: PenaltyType::FalseAvailability,
            amount: FALSE_AVAILABILITY_PENALTY,
            description: format!(
                "Property marked available while {}",
                property.stage.as_str()
            ),
        });
    }

    if property.stage == PropertyStage::Blocked {
        if let Some(expired_at) = blockage_expiry(property) {
            if now > expired_at {
                violations.push(Violation {
                    penalty_type: PenaltyType::ContractBreach,
                    amount: CONTRACT_BREACH_PENALTY,
                    description: format!(
                        "Blockage period expired on {} but property is still blocked",
                        expired_at.to_rfc3339()
                    ),
                });
            }
        }
    }

    violations
}

fn blockage_expiry(property: &Property) -> Option<DateTime<Utc>> {
    let start = property.fundraising_start_date?;
    let days = property.blockage_period?;
    start.checked_add_signed(Duration::try_days(days)?)
}

/// Appends one pending penalty per violation plus a single inspection entry.
/// Returns how many penalties were added. `updated_at` is left alone: it
/// tracks listing freshness, which penalty bookkeeping does not change.
pub fn apply_violations(
    property: &mut Property,
    violations: &[Violation],
    checked_by: Uuid,
    now: DateTime<Utc>,
) -> Result<usize, PenaltyTotalsOverflow> {
    if violations.is_empty() {
        return Ok(0);
    }

    for violation in violations {
        property.push_penalty(PenaltyEntry::pending(
            now,
            violation.penalty_type,
            violation.amount,
            violation.description.clone(),
            checked_by,
            Some("Imposed by automated violation check".to_string()),
        ))?;
    }

    let summary = violations
        .iter()
        .map(|v| format!("{} ({})", v.penalty_type.as_str(), v.amount))
        .collect::<Vec<_>>()
        .join(", ");

    property.push_contact(ContactEntry::new(
        now,
        ContactType::Inspection,
        format!("Violation check imposed penalties: {}", summary),
        checked_by,
        Some("penalties_imposed".to_string()),
    ));

    Ok(violations.len())
}
