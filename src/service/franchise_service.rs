use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::Store,
    dtos::franchisedtos::{CreateFranchiseDto, CreateFranchiserDto},
    models::franchisemodel::{Franchise, FranchiseStatus, Franchiser},
    service::error::ServiceError,
};

#[derive(Clone)]
pub struct FranchiseService {
    db_client: Arc<dyn Store>,
}

impl fmt::Debug for FranchiseService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FranchiseService")
            .field("backend", &self.db_client.backend_tag())
            .finish()
    }
}

impl FranchiseService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn create_franchiser(&self, body: CreateFranchiserDto) -> Result<Franchiser, ServiceError> {
        let franchiser = Franchiser {
            id: Uuid::new_v4(),
            name: body.name,
            industry: body.industry,
            created_at: Utc::now(),
        };
        self.db_client.insert_franchiser(&franchiser).await?;

        tracing::info!("Franchiser {} registered as {}", franchiser.name, franchiser.id);
        Ok(franchiser)
    }

    pub async fn get_franchiser(&self, franchiser_id: Uuid) -> Result<Franchiser, ServiceError> {
        self.db_client
            .get_franchiser(franchiser_id)
            .await?
            .ok_or(ServiceError::FranchiserNotFound(franchiser_id))
    }

    pub async fn create_franchise(&self, body: CreateFranchiseDto) -> Result<Franchise, ServiceError> {
        self.get_franchiser(body.franchiser_id).await?;

        let franchise = Franchise {
            id: Uuid::new_v4(),
            franchiser_id: body.franchiser_id,
            name: body.name,
            location: body.location,
            status: FranchiseStatus::default(),
            created_at: Utc::now(),
        };
        self.db_client.insert_franchise(&franchise).await?;

        tracing::info!("Franchise {} opened under {}", franchise.id, franchise.franchiser_id);
        Ok(franchise)
    }

    pub async fn get_franchise(&self, franchise_id: Uuid) -> Result<Franchise, ServiceError> {
        self.db_client
            .get_franchise(franchise_id)
            .await?
            .ok_or(ServiceError::FranchiseNotFound(franchise_id))
    }
}
