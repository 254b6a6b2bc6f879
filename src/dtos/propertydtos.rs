use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    franchisemodel::{Franchise, Franchiser},
    propertymodel::{
        ContactType, Coordinates, PenaltyStatus, PenaltyType, Priority, Property, PropertyStage,
        PropertyType,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LandlordContactDto {
    #[validate(length(min = 1, max = 200, message = "Landlord name is required"))]
    pub name: String,

    #[validate(length(min = 5, max = 20, message = "Phone number must be between 5-20 characters"))]
    pub phone: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePropertyDto {
    #[validate(length(min = 5, max = 500, message = "Address must be between 5 and 500 characters"))]
    pub address: String,

    pub coordinates: Coordinates,

    #[validate(length(min = 1, max = 200, message = "Building name is required"))]
    pub building_name: String,

    #[validate(length(min = 1, max = 50, message = "Door number is required"))]
    pub door_number: String,

    #[validate(range(min = 1.0, message = "Square footage must be positive"))]
    pub sqft: f64,

    #[validate(range(min = 0.0, message = "Cost per square foot cannot be negative"))]
    pub cost_per_sqft: f64,

    pub property_type: PropertyType,

    #[serde(default)]
    pub amenities: Vec<String>,

    #[serde(default)]
    pub images: Vec<String>,

    #[validate]
    pub landlord_contact: LandlordContactDto,

    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,

    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,

    pub fundraising_start_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Blockage period cannot be negative"))]
    pub blockage_period: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PropertyQueryDto {
    pub stage: Option<PropertyStage>,
    pub assigned_to: Option<Uuid>,
    pub is_available: Option<bool>,
    pub is_verified: Option<bool>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQueryDto {
    #[validate(length(max = 200))]
    pub q: String,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStageDto {
    pub stage: PropertyStage,
    pub franchise_id: Option<Uuid>,
    pub franchiser_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAvailabilityDto {
    pub is_available: bool,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusDto {
    pub stage: PropertyStage,
    pub is_available: Option<bool>,
    pub check_violations: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkStageDto {
    #[validate(length(min = 1, message = "At least one property id is required"))]
    pub property_ids: Vec<String>,
    pub stage: PropertyStage,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPropertyDto {
    pub is_verified: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub verified_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignPropertyDto {
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactDto {
    pub contact_type: ContactType,
    #[validate(length(min = 1, max = 2000, message = "Notes are required"))]
    pub notes: String,
    pub contacted_by: Uuid,
    #[validate(length(max = 200))]
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImposePenaltyDto {
    pub penalty_type: PenaltyType,
    #[validate(range(min = 1, max = 1000000000, message = "Penalty amount must be between 1 and 1000000000"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
    pub imposed_by: Uuid,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_penalty_reference", skip_on_field_errors = false))]
pub struct UpdatePenaltyStatusDto {
    pub penalty_id: Option<Uuid>,
    pub penalty_date: Option<DateTime<Utc>>,
    pub status: PenaltyStatus,
    pub updated_by: Uuid,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn validate_penalty_reference(dto: &UpdatePenaltyStatusDto) -> Result<(), ValidationError> {
    if dto.penalty_id.is_none() && dto.penalty_date.is_none() {
        let mut error = ValidationError::new("penalty_reference");
        error.message = Some("Either penalty_id or penalty_date is required".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckViolationsDto {
    pub checked_by: Uuid,
}

/// A property with its franchise relations resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyWithRelations {
    #[serde(flatten)]
    pub property: Property,
    pub franchise: Option<Franchise>,
    pub franchiser: Option<Franchiser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImposedPenaltyDto {
    pub success: bool,
    pub penalty_id: Uuid,
    pub penalty_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkItemResult {
    pub property_id: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkStageResponse {
    pub success: bool,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}
