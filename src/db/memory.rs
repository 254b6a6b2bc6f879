use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{
        franchisedb::FranchiseExt,
        investmentdb::InvestmentExt,
        propertydb::{PropertyExt, PropertyFilter},
        Store, StoreError,
    },
    models::{
        franchisemodel::{Franchise, Franchiser},
        investmentmodel::{FranchiseShare, Investment, ShareStatus},
        propertymodel::Property,
    },
};

/// In-process backend. Used when no database is configured and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    properties: RwLock<HashMap<Uuid, Property>>,
    franchisers: RwLock<HashMap<Uuid, Franchiser>>,
    franchises: RwLock<HashMap<Uuid, Franchise>>,
    investments: RwLock<HashMap<Uuid, Investment>>, // keyed by franchise id
    shares: RwLock<HashMap<Uuid, FranchiseShare>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }
}

fn newest_first(mut properties: Vec<Property>) -> Vec<Property> {
    properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    properties
}

#[async_trait]
impl PropertyExt for MemoryStore {
    async fn insert_property(&self, property: &Property) -> Result<(), StoreError> {
        let mut properties = self.properties.write().await;
        if properties.contains_key(&property.id) {
            return Err(StoreError::AlreadyExists(property.id));
        }
        properties.insert(property.id, property.clone());
        Ok(())
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, StoreError> {
        Ok(self.properties.read().await.get(&property_id).cloned())
    }

    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let matching: Vec<Property> = self
            .properties
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        let mut sorted = newest_first(matching);
        sorted.truncate(filter.limit);
        Ok(sorted)
    }

    async fn all_properties(&self) -> Result<Vec<Property>, StoreError> {
        let all = self.properties.read().await.values().cloned().collect();
        Ok(newest_first(all))
    }

    async fn replace_property(&self, property: &Property) -> Result<Property, StoreError> {
        let mut properties = self.properties.write().await;
        let current = properties
            .get(&property.id)
            .ok_or(StoreError::NotFound(property.id))?;

        if current.version != property.version {
            return Err(StoreError::VersionConflict { id: property.id });
        }

        let mut stored = property.clone();
        stored.version += 1;
        properties.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl FranchiseExt for MemoryStore {
    async fn insert_franchiser(&self, franchiser: &Franchiser) -> Result<(), StoreError> {
        let mut franchisers = self.franchisers.write().await;
        if franchisers.contains_key(&franchiser.id) {
            return Err(StoreError::AlreadyExists(franchiser.id));
        }
        franchisers.insert(franchiser.id, franchiser.clone());
        Ok(())
    }

    async fn get_franchiser(&self, franchiser_id: Uuid) -> Result<Option<Franchiser>, StoreError> {
        Ok(self.franchisers.read().await.get(&franchiser_id).cloned())
    }

    async fn insert_franchise(&self, franchise: &Franchise) -> Result<(), StoreError> {
        let mut franchises = self.franchises.write().await;
        if franchises.contains_key(&franchise.id) {
            return Err(StoreError::AlreadyExists(franchise.id));
        }
        franchises.insert(franchise.id, franchise.clone());
        Ok(())
    }

    async fn get_franchise(&self, franchise_id: Uuid) -> Result<Option<Franchise>, StoreError> {
        Ok(self.franchises.read().await.get(&franchise_id).cloned())
    }
}

#[async_trait]
impl InvestmentExt for MemoryStore {
    async fn insert_investment(&self, investment: &Investment) -> Result<(), StoreError> {
        let mut investments = self.investments.write().await;
        if investments.contains_key(&investment.franchise_id) {
            return Err(StoreError::AlreadyExists(investment.franchise_id));
        }
        investments.insert(investment.franchise_id, investment.clone());
        Ok(())
    }

    async fn get_investment_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Option<Investment>, StoreError> {
        Ok(self.investments.read().await.get(&franchise_id).cloned())
    }

    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, StoreError> {
        let mut investments = self.investments.write().await;
        let current = investments
            .get(&investment.franchise_id)
            .ok_or(StoreError::NotFound(investment.id))?;

        if current.version != investment.version {
            return Err(StoreError::VersionConflict { id: investment.id });
        }

        let mut stored = investment.clone();
        stored.version += 1;
        investments.insert(stored.franchise_id, stored.clone());
        Ok(stored)
    }

    async fn insert_share(&self, share: &FranchiseShare) -> Result<(), StoreError> {
        let mut shares = self.shares.write().await;
        if shares.contains_key(&share.id) {
            return Err(StoreError::AlreadyExists(share.id));
        }
        shares.insert(share.id, share.clone());
        Ok(())
    }

    async fn get_share(&self, share_id: Uuid) -> Result<Option<FranchiseShare>, StoreError> {
        Ok(self.shares.read().await.get(&share_id).cloned())
    }

    async fn update_share(
        &self,
        share: &FranchiseShare,
        expected: ShareStatus,
    ) -> Result<(), StoreError> {
        let mut shares = self.shares.write().await;
        let current = shares.get(&share.id).ok_or(StoreError::NotFound(share.id))?;
        if current.status != expected {
            return Err(StoreError::VersionConflict { id: share.id });
        }
        shares.insert(share.id, share.clone());
        Ok(())
    }

    async fn list_shares_by_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Vec<FranchiseShare>, StoreError> {
        let mut shares: Vec<FranchiseShare> = self
            .shares
            .read()
            .await
            .values()
            .filter(|s| s.franchise_id == franchise_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shares)
    }

    async fn list_shares_by_investor(
        &self,
        investor_id: &str,
    ) -> Result<Vec<FranchiseShare>, StoreError> {
        let mut shares: Vec<FranchiseShare> = self
            .shares
            .read()
            .await
            .values()
            .filter(|s| s.investor_id == investor_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shares)
    }
}
