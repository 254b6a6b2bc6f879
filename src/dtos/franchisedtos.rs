use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFranchiserDto {
    #[validate(length(min = 2, max = 200, message = "Brand name must be between 2 and 200 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFranchiseDto {
    pub franchiser_id: Uuid,
    #[validate(length(min = 2, max = 200, message = "Franchise name must be between 2 and 200 characters"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub location: Option<String>,
}
