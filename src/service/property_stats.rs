use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::propertymodel::{PenaltyStatus, PenaltyType, Property, PropertyStage, PropertyType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyStats {
    pub total: usize,
    pub by_stage: BTreeMap<PropertyStage, usize>,
    pub by_property_type: BTreeMap<PropertyType, usize>,
    pub available: usize,
    pub verified: usize,
    pub matched_to_franchise: usize,
    pub total_penalties: i64,
    pub unpaid_penalties: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyStats {
    pub total_count: usize,
    pub total_amount: i64,
    pub unpaid_amount: i64,
    pub paid_amount: i64,
    pub waived_amount: i64,
    pub by_status: BTreeMap<PenaltyStatus, usize>,
    pub by_type: BTreeMap<PenaltyType, usize>,
    pub properties_with_penalties: usize,
    pub properties_with_unpaid: usize,
}

const ALL_STAGES: [PropertyStage; 5] = [
    PropertyStage::Listing,
    PropertyStage::Requested,
    PropertyStage::Blocked,
    PropertyStage::Rented,
    PropertyStage::Sold,
];

const ALL_PENALTY_STATUSES: [PenaltyStatus; 4] = [
    PenaltyStatus::Pending,
    PenaltyStatus::Paid,
    PenaltyStatus::Waived,
    PenaltyStatus::Disputed,
];

pub fn property_stats(properties: &[Property]) -> PropertyStats {
    let mut by_stage: BTreeMap<PropertyStage, usize> = ALL_STAGES.iter().map(|s| (*s, 0)).collect();
    let mut by_property_type = BTreeMap::new();

    for property in properties {
        *by_stage.entry(property.stage).or_insert(0) += 1;
        *by_property_type.entry(property.property_type).or_insert(0) += 1;
    }

    PropertyStats {
        total: properties.len(),
        by_stage,
        by_property_type,
        available: properties.iter().filter(|p| p.is_available).count(),
        verified: properties.iter().filter(|p| p.is_verified).count(),
        matched_to_franchise: properties.iter().filter(|p| p.franchise_id.is_some()).count(),
        total_penalties: properties
            .iter()
            .fold(0i64, |sum, p| sum.saturating_add(p.total_penalties)),
        unpaid_penalties: properties
            .iter()
            .fold(0i64, |sum, p| sum.saturating_add(p.unpaid_penalties)),
    }
}

pub fn penalty_stats(properties: &[Property]) -> PenaltyStats {
    let mut stats = PenaltyStats {
        total_count: 0,
        total_amount: 0,
        unpaid_amount: 0,
        paid_amount: 0,
        waived_amount: 0,
        by_status: ALL_PENALTY_STATUSES.iter().map(|s| (*s, 0)).collect(),
        by_type: BTreeMap::new(),
        properties_with_penalties: 0,
        properties_with_unpaid: 0,
    };

    for property in properties {
        if !property.penalty_history.is_empty() {
            stats.properties_with_penalties += 1;
        }
        if property.penalty_history.iter().any(|p| p.status.is_unpaid()) {
            stats.properties_with_unpaid += 1;
        }

        for penalty in &property.penalty_history {
            stats.total_count += 1;
            stats.total_amount = stats.total_amount.saturating_add(penalty.amount);
            let bucket = match penalty.status {
                PenaltyStatus::Pending | PenaltyStatus::Disputed => &mut stats.unpaid_amount,
                PenaltyStatus::Paid => &mut stats.paid_amount,
                PenaltyStatus::Waived => &mut stats.waived_amount,
            };
            *bucket = bucket.saturating_add(penalty.amount);
            *stats.by_status.entry(penalty.status).or_insert(0) += 1;
            *stats.by_type.entry(penalty.penalty_type).or_insert(0) += 1;
        }
    }

    stats
}
