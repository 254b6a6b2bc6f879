// service/property_service.rs
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{propertydb::{PropertyFilter, DEFAULT_PROPERTY_LIMIT}, Store, StoreError},
    dtos::propertydtos::{
        AssignPropertyDto, BulkItemResult, BulkStageDto, BulkStageResponse, ContactDto,
        CreatePropertyDto, ImposePenaltyDto, ImposedPenaltyDto, PropertyQueryDto,
        PropertyWithRelations, UpdateAvailabilityDto, UpdatePenaltyStatusDto, UpdateStageDto,
        UpdateStatusDto, VerifyPropertyDto,
    },
    error::ErrorMessage,
    models::propertymodel::{
        ContactEntry, ContactType, LandlordContact, PenaltyEntry, Property, PropertyStage,
    },
    service::{
        error::ServiceError,
        penalty_engine::{apply_violations, evaluate_violations, ViolationReport},
        property_stats::{penalty_stats, property_stats, PenaltyStats, PropertyStats},
    },
};

/// Read-modify-write attempts before giving up on a contended record.
pub const MAX_WRITE_ATTEMPTS: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateOutcome {
    pub property: Property,
    pub violations: Option<ViolationReport>,
}

#[derive(Clone)]
pub struct PropertyService {
    db_client: Arc<dyn Store>,
    bulk_concurrency: usize,
}

impl fmt::Debug for PropertyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyService")
            .field("backend", &self.db_client.backend_tag())
            .field("bulk_concurrency", &self.bulk_concurrency)
            .finish()
    }
}

impl PropertyService {
    pub fn new(db_client: Arc<dyn Store>, bulk_concurrency: usize) -> Self {
        Self {
            db_client,
            bulk_concurrency: bulk_concurrency.max(1),
        }
    }

    /// Fetches the record, applies `apply` and writes it back. A concurrent
    /// writer makes the write fail on version; the whole cycle is then
    /// retried on a fresh snapshot.
    async fn mutate<F, T>(&self, property_id: Uuid, mut apply: F) -> Result<(Property, T), ServiceError>
    where
        F: FnMut(&mut Property) -> Result<T, ServiceError> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut property = self
                .db_client
                .get_property(property_id)
                .await?
                .ok_or(ServiceError::PropertyNotFound(property_id))?;

            let outcome = apply(&mut property)?;

            match self.db_client.replace_property(&property).await {
                Ok(stored) => return Ok((stored, outcome)),
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::warn!(
                        "Property {} changed during update (attempt {}/{}), retrying",
                        property_id,
                        attempt,
                        MAX_WRITE_ATTEMPTS
                    );
                }
                Err(StoreError::NotFound(_)) => return Err(ServiceError::PropertyNotFound(property_id)),
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(property_id))
    }

    async fn enrich(&self, property: Property) -> Result<PropertyWithRelations, ServiceError> {
        let franchise = match property.franchise_id {
            Some(id) => self.db_client.get_franchise(id).await?,
            None => None,
        };

        let franchiser_id = property
            .franchiser_id
            .or_else(|| franchise.as_ref().map(|f| f.franchiser_id));
        let franchiser = match franchiser_id {
            Some(id) => self.db_client.get_franchiser(id).await?,
            None => None,
        };

        Ok(PropertyWithRelations {
            property,
            franchise,
            franchiser,
        })
    }

    pub async fn create_property(&self, body: CreatePropertyDto) -> Result<Property, ServiceError> {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            version: 0,
            address: body.address,
            coordinates: body.coordinates,
            building_name: body.building_name,
            door_number: body.door_number,
            sqft: body.sqft,
            cost_per_sqft: body.cost_per_sqft,
            property_type: body.property_type,
            amenities: body.amenities,
            images: body.images,
            landlord_contact: LandlordContact {
                name: body.landlord_contact.name,
                phone: body.landlord_contact.phone,
                email: body.landlord_contact.email,
            },
            priority: body.priority.unwrap_or_default(),
            assigned_to: body.assigned_to,
            franchise_id: None,
            franchiser_id: None,
            is_verified: false,
            verification_notes: None,
            verified_by: None,
            verified_at: None,
            stage: PropertyStage::Listing,
            is_available: true,
            available_from: body.available_from,
            available_until: body.available_until,
            fundraising_start_date: body.fundraising_start_date,
            blockage_period: body.blockage_period,
            contact_history: Vec::new(),
            penalty_history: Vec::new(),
            total_penalties: 0,
            unpaid_penalties: 0,
            created_at: now,
            updated_at: now,
        };

        self.db_client.insert_property(&property).await?;
        tracing::info!("Property {} created at {}", property.id, property.address);
        Ok(property)
    }

    pub async fn get_property(&self, property_id: Uuid) -> Result<PropertyWithRelations, ServiceError> {
        let property = self
            .db_client
            .get_property(property_id)
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))?;

        self.enrich(property).await
    }

    pub async fn get_properties(
        &self,
        query: PropertyQueryDto,
    ) -> Result<Vec<PropertyWithRelations>, ServiceError> {
        let filter = PropertyFilter {
            stage: query.stage,
            assigned_to: query.assigned_to,
            is_available: query.is_available,
            is_verified: query.is_verified,
            limit: query.limit.unwrap_or(DEFAULT_PROPERTY_LIMIT),
        };

        let properties = self.db_client.list_properties(&filter).await?;
        let mut enriched = Vec::with_capacity(properties.len());
        for property in properties {
            enriched.push(self.enrich(property).await?);
        }
        Ok(enriched)
    }

    pub async fn update_stage(
        &self,
        property_id: Uuid,
        body: UpdateStageDto,
    ) -> Result<Property, ServiceError> {
        let (property, previous) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                let previous = property.stage;

                property.stage = body.stage;
                if let Some(franchise_id) = body.franchise_id {
                    property.franchise_id = Some(franchise_id);
                }
                if let Some(franchiser_id) = body.franchiser_id {
                    property.franchiser_id = Some(franchiser_id);
                }

                let mut note = format!(
                    "Stage changed from {} to {}",
                    previous.as_str(),
                    body.stage.as_str()
                );
                if let Some(extra) = &body.notes {
                    note.push_str(": ");
                    note.push_str(extra);
                }
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Meeting,
                    note,
                    body.updated_by,
                    Some(body.stage.as_str().to_string()),
                ));
                property.updated_at = now;
                Ok(previous)
            })
            .await?;

        tracing::info!(
            "Property {} stage {} -> {} by {}",
            property_id,
            previous.as_str(),
            property.stage.as_str(),
            body.updated_by
        );
        Ok(property)
    }

    pub async fn update_availability(
        &self,
        property_id: Uuid,
        body: UpdateAvailabilityDto,
    ) -> Result<Property, ServiceError> {
        let (property, _) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                let outcome = if body.is_available { "available" } else { "unavailable" };

                property.is_available = body.is_available;
                if body.available_from.is_some() {
                    property.available_from = body.available_from;
                }
                if body.available_until.is_some() {
                    property.available_until = body.available_until;
                }

                let mut note = format!("Availability set to {}", outcome);
                if let Some(extra) = &body.notes {
                    note.push_str(": ");
                    note.push_str(extra);
                }
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Meeting,
                    note,
                    body.updated_by,
                    Some(outcome.to_string()),
                ));
                property.updated_at = now;
                Ok(())
            })
            .await?;

        tracing::info!(
            "Property {} availability set to {} by {}",
            property_id,
            property.is_available,
            body.updated_by
        );
        Ok(property)
    }

    /// Stage, then availability, then the violation check. Each step is its
    /// own write; a failure in a later step leaves earlier ones in place.
    pub async fn update_status_with_penalty_check(
        &self,
        property_id: Uuid,
        body: UpdateStatusDto,
    ) -> Result<StatusUpdateOutcome, ServiceError> {
        let mut property = self
            .update_stage(
                property_id,
                UpdateStageDto {
                    stage: body.stage,
                    franchise_id: None,
                    franchiser_id: None,
                    notes: body.notes.clone(),
                    updated_by: body.updated_by,
                },
            )
            .await?;

        if let Some(is_available) = body.is_available {
            property = self
                .update_availability(
                    property_id,
                    UpdateAvailabilityDto {
                        is_available,
                        available_from: None,
                        available_until: None,
                        notes: body.notes.clone(),
                        updated_by: body.updated_by,
                    },
                )
                .await?;
        }

        let violations = if body.check_violations.unwrap_or(true) {
            let report = self.check_violations(property_id, body.updated_by).await?;
            if report.penalties_imposed > 0 {
                property = self
                    .db_client
                    .get_property(property_id)
                    .await?
                    .ok_or(ServiceError::PropertyNotFound(property_id))?;
            }
            Some(report)
        } else {
            None
        };

        Ok(StatusUpdateOutcome { property, violations })
    }

    /// Every id is handled on its own; one failure never stops the others.
    /// Results come back in request order.
    pub async fn bulk_update_stages(&self, body: BulkStageDto) -> BulkStageResponse {
        let results: Vec<BulkItemResult> = stream::iter(body.property_ids.iter().cloned())
            .map(|raw_id| {
                let stage_update = UpdateStageDto {
                    stage: body.stage,
                    franchise_id: None,
                    franchiser_id: None,
                    notes: body.notes.clone(),
                    updated_by: body.updated_by,
                };
                async move {
                    let outcome = match Uuid::parse_str(raw_id.trim()) {
                        Ok(property_id) => self
                            .update_stage(property_id, stage_update)
                            .await
                            .map(|_| ())
                            .map_err(|e| e.to_string()),
                        Err(_) => Err(ErrorMessage::InvalidPropertyId.to_string()),
                    };

                    match outcome {
                        Ok(()) => BulkItemResult {
                            property_id: raw_id,
                            success: true,
                            error: None,
                        },
                        Err(reason) => {
                            tracing::warn!("Bulk stage update failed for {}: {}", raw_id, reason);
                            BulkItemResult {
                                property_id: raw_id,
                                success: false,
                                error: Some(reason),
                            }
                        }
                    }
                }
            })
            .buffered(self.bulk_concurrency)
            .collect()
            .await;

        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        tracing::info!(
            "Bulk stage update to {}: {} succeeded, {} failed",
            body.stage.as_str(),
            successful,
            failed
        );

        BulkStageResponse {
            success: true,
            successful,
            failed,
            results,
        }
    }

    pub async fn verify_property(
        &self,
        property_id: Uuid,
        body: VerifyPropertyDto,
    ) -> Result<Property, ServiceError> {
        let (property, _) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                property.is_verified = body.is_verified;
                property.verification_notes = body.notes.clone();
                property.verified_by = Some(body.verified_by);
                property.verified_at = Some(now);

                let outcome = if body.is_verified { "verified" } else { "unverified" };
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Inspection,
                    body.notes
                        .clone()
                        .unwrap_or_else(|| format!("Property marked {}", outcome)),
                    body.verified_by,
                    Some(outcome.to_string()),
                ));
                property.updated_at = now;
                Ok(())
            })
            .await?;

        tracing::info!("Property {} verification set to {}", property_id, property.is_verified);
        Ok(property)
    }

    pub async fn assign_property(
        &self,
        property_id: Uuid,
        body: AssignPropertyDto,
    ) -> Result<Property, ServiceError> {
        let (property, _) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                property.assigned_to = Some(body.assigned_to);
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Meeting,
                    format!("Assigned to {}", body.assigned_to),
                    body.assigned_by,
                    Some("assigned".to_string()),
                ));
                property.updated_at = now;
                Ok(())
            })
            .await?;

        Ok(property)
    }

    pub async fn add_contact(
        &self,
        property_id: Uuid,
        body: ContactDto,
    ) -> Result<Property, ServiceError> {
        let (property, _) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                property.push_contact(ContactEntry::new(
                    now,
                    body.contact_type,
                    body.notes.clone(),
                    body.contacted_by,
                    body.outcome.clone(),
                ));
                property.updated_at = now;
                Ok(())
            })
            .await?;

        Ok(property)
    }

    pub async fn impose_penalty(
        &self,
        property_id: Uuid,
        body: ImposePenaltyDto,
    ) -> Result<ImposedPenaltyDto, ServiceError> {
        let (property, penalty) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                let penalty = PenaltyEntry::pending(
                    now,
                    body.penalty_type,
                    body.amount,
                    body.reason.clone(),
                    body.imposed_by,
                    body.notes.clone(),
                );
                let reference = (penalty.id, penalty.date);
                property.push_penalty(penalty)?;
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Email,
                    format!(
                        "Penalty imposed: {} of {} ({})",
                        body.penalty_type.as_str(),
                        body.amount,
                        body.reason
                    ),
                    body.imposed_by,
                    Some("penalty_imposed".to_string()),
                ));
                Ok(reference)
            })
            .await?;

        tracing::info!(
            "Penalty {} of {} imposed on property {}, unpaid now {}",
            body.penalty_type.as_str(),
            body.amount,
            property_id,
            property.unpaid_penalties
        );

        Ok(ImposedPenaltyDto {
            success: true,
            penalty_id: penalty.0,
            penalty_date: penalty.1,
        })
    }

    pub async fn update_penalty_status(
        &self,
        property_id: Uuid,
        body: UpdatePenaltyStatusDto,
    ) -> Result<Property, ServiceError> {
        let (property, penalty_id) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                let penalty = property
                    .find_penalty_mut(body.penalty_id, body.penalty_date)
                    .ok_or(ServiceError::PenaltyNotFound)?;

                penalty.status = body.status;
                penalty.notes = body.notes.clone();
                penalty.updated_by = Some(body.updated_by);
                penalty.updated_at = Some(now);
                let penalty_id = penalty.id;

                property.recompute_penalty_totals()?;
                property.push_contact(ContactEntry::new(
                    now,
                    ContactType::Email,
                    format!("Penalty {} marked {}", penalty_id, body.status.as_str()),
                    body.updated_by,
                    Some(body.status.as_str().to_string()),
                ));
                Ok(penalty_id)
            })
            .await?;

        tracing::info!(
            "Penalty {} on property {} is now {}, unpaid {}",
            penalty_id,
            property_id,
            body.status.as_str(),
            property.unpaid_penalties
        );
        Ok(property)
    }

    /// Not idempotent: a record that still violates a rule is penalised again
    /// on every call.
    pub async fn check_violations(
        &self,
        property_id: Uuid,
        checked_by: Uuid,
    ) -> Result<ViolationReport, ServiceError> {
        let snapshot = self
            .db_client
            .get_property(property_id)
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))?;

        if evaluate_violations(&snapshot, Utc::now()).is_empty() {
            return Ok(ViolationReport::empty());
        }

        let (_, report) = self
            .mutate(property_id, |property| {
                let now = Utc::now();
                let violations = evaluate_violations(property, now);
                let imposed = apply_violations(property, &violations, checked_by, now)?;
                Ok(ViolationReport {
                    violations_found: violations.len(),
                    penalties_imposed: imposed,
                    violations: violations.into_iter().map(|v| v.description).collect(),
                })
            })
            .await?;

        if report.penalties_imposed > 0 {
            tracing::warn!(
                "Property {}: {} violation(s) found, penalties imposed",
                property_id,
                report.violations_found
            );
        }
        Ok(report)
    }

    pub async fn property_stats(&self) -> Result<PropertyStats, ServiceError> {
        let properties = self.db_client.all_properties().await?;
        Ok(property_stats(&properties))
    }

    pub async fn penalty_stats(&self) -> Result<PenaltyStats, ServiceError> {
        let properties = self.db_client.all_properties().await?;
        Ok(penalty_stats(&properties))
    }

    /// Substring match on address, building name and landlord name,
    /// newest first.
    pub async fn search_properties(
        &self,
        term: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Property>, ServiceError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<Property> = self
            .db_client
            .all_properties()
            .await?
            .into_iter()
            .filter(|p| p.matches_search(&needle))
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{franchisedb::FranchiseExt, memory::MemoryStore, propertydb::PropertyExt},
        dtos::propertydtos::LandlordContactDto,
        models::{
            franchisemodel::{Franchise, FranchiseStatus, Franchiser},
            propertymodel::{fixtures, Coordinates, PenaltyStatus, PenaltyType, PropertyType},
        },
    };
    use chrono::Duration;

    fn service() -> (Arc<MemoryStore>, PropertyService) {
        let store = Arc::new(MemoryStore::new());
        let service = PropertyService::new(store.clone(), 4);
        (store, service)
    }

    fn create_body(address: &str) -> CreatePropertyDto {
        CreatePropertyDto {
            address: address.to_string(),
            coordinates: Coordinates { lat: 12.93, lng: 77.62 },
            building_name: "Embassy Golf Links".to_string(),
            door_number: "G-12".to_string(),
            sqft: 2400.0,
            cost_per_sqft: 120.0,
            property_type: PropertyType::Commercial,
            amenities: vec!["power backup".to_string()],
            images: Vec::new(),
            landlord_contact: LandlordContactDto {
                name: "Ravi Kumar".to_string(),
                phone: "+919811111111".to_string(),
                email: None,
            },
            priority: None,
            assigned_to: None,
            available_from: None,
            available_until: None,
            fundraising_start_date: None,
            blockage_period: None,
        }
    }

    fn stage_body(stage: PropertyStage, by: Uuid) -> UpdateStageDto {
        UpdateStageDto {
            stage,
            franchise_id: None,
            franchiser_id: None,
            notes: None,
            updated_by: by,
        }
    }

    async fn insert_stale_listing(store: &MemoryStore) -> Property {
        let mut property = fixtures::property("Stale Listing, Indiranagar");
        property.updated_at = Utc::now() - Duration::days(8);
        store.insert_property(&property).await.unwrap();
        property
    }

    #[tokio::test]
    async fn created_property_starts_as_available_listing() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        assert_eq!(property.stage, PropertyStage::Listing);
        assert!(property.is_available);
        assert!(!property.is_verified);
        assert!(property.contact_history.is_empty());
        assert!(property.penalty_history.is_empty());
        assert_eq!(property.total_penalties, 0);
        assert_eq!(property.unpaid_penalties, 0);
    }

    #[tokio::test]
    async fn fresh_property_has_no_violations() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let report = service.check_violations(property.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(report.violations_found, 0);
        assert_eq!(report.penalties_imposed, 0);
    }

    #[tokio::test]
    async fn stale_listing_gets_one_late_update_penalty() {
        let (store, service) = service();
        let property = insert_stale_listing(&store).await;

        let report = service.check_violations(property.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(report.violations_found, 1);
        assert_eq!(report.penalties_imposed, 1);

        let stored = store.get_property(property.id).await.unwrap().unwrap();
        assert_eq!(stored.penalty_history.len(), 1);
        assert_eq!(stored.penalty_history[0].penalty_type, PenaltyType::LateUpdate);
        assert_eq!(stored.unpaid_penalties, 100);
        assert_eq!(stored.total_penalties, 100);
    }

    #[tokio::test]
    async fn repeated_checks_penalise_again() {
        let (store, service) = service();
        let property = insert_stale_listing(&store).await;
        let checker = Uuid::new_v4();

        service.check_violations(property.id, checker).await.unwrap();
        service.check_violations(property.id, checker).await.unwrap();

        let stored = store.get_property(property.id).await.unwrap().unwrap();
        assert_eq!(stored.penalty_history.len(), 2);
        assert_eq!(stored.penalty_history[0].reason, stored.penalty_history[1].reason);
        assert_eq!(stored.unpaid_penalties, 200);
    }

    #[tokio::test]
    async fn sold_and_available_gets_false_availability() {
        let (store, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        service
            .update_stage(property.id, stage_body(PropertyStage::Sold, Uuid::new_v4()))
            .await
            .unwrap();

        let report = service.check_violations(property.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(report.violations_found, 1);

        let stored = store.get_property(property.id).await.unwrap().unwrap();
        assert_eq!(stored.penalty_history[0].penalty_type, PenaltyType::FalseAvailability);
        assert_eq!(stored.penalty_history[0].amount, 500);
    }

    #[tokio::test]
    async fn stage_update_logs_contact_and_sets_relations() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        let franchise_id = Uuid::new_v4();
        let actor = Uuid::new_v4();

        let updated = service
            .update_stage(
                property.id,
                UpdateStageDto {
                    stage: PropertyStage::Blocked,
                    franchise_id: Some(franchise_id),
                    franchiser_id: None,
                    notes: Some("Brand confirmed".to_string()),
                    updated_by: actor,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stage, PropertyStage::Blocked);
        assert_eq!(updated.franchise_id, Some(franchise_id));
        assert_eq!(updated.version, 1);
        let entry = updated.contact_history.last().unwrap();
        assert_eq!(entry.outcome.as_deref(), Some("blocked"));
        assert_eq!(entry.contacted_by, actor);
        assert!(entry.notes.contains("Brand confirmed"));
    }

    #[tokio::test]
    async fn any_stage_is_reachable_from_any_stage() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        let actor = Uuid::new_v4();

        for stage in [PropertyStage::Sold, PropertyStage::Listing, PropertyStage::Rented] {
            let updated = service.update_stage(property.id, stage_body(stage, actor)).await.unwrap();
            assert_eq!(updated.stage, stage);
        }
    }

    #[tokio::test]
    async fn unknown_property_fails_with_not_found() {
        let (_, service) = service();
        let err = service
            .update_stage(Uuid::new_v4(), stage_body(PropertyStage::Sold, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Property not found");
    }

    #[tokio::test]
    async fn availability_toggle_is_independent_of_stage() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        service
            .update_stage(property.id, stage_body(PropertyStage::Rented, Uuid::new_v4()))
            .await
            .unwrap();

        let updated = service
            .update_availability(
                property.id,
                UpdateAvailabilityDto {
                    is_available: true,
                    available_from: None,
                    available_until: None,
                    notes: None,
                    updated_by: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stage, PropertyStage::Rented);
        assert!(updated.is_available);
        assert_eq!(
            updated.contact_history.last().and_then(|c| c.outcome.as_deref()),
            Some("available")
        );
    }

    #[tokio::test]
    async fn impose_penalty_updates_rollups() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let imposed = service
            .impose_penalty(
                property.id,
                ImposePenaltyDto {
                    penalty_type: PenaltyType::Misinformation,
                    amount: 250,
                    reason: "Square footage overstated".to_string(),
                    imposed_by: Uuid::new_v4(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert!(imposed.success);

        let stored = service.get_property(property.id).await.unwrap().property;
        assert_eq!(stored.total_penalties, 250);
        assert_eq!(stored.unpaid_penalties, 250);
        assert_eq!(stored.penalty_history.len(), 1);
        assert_eq!(stored.penalty_history[0].status, PenaltyStatus::Pending);
        assert_eq!(stored.penalty_history[0].id, imposed.penalty_id);
        assert_eq!(stored.penalty_history[0].date, imposed.penalty_date);
    }

    #[tokio::test]
    async fn penalty_status_update_recomputes_unpaid_from_log() {
        let (store, service) = service();
        let mut property = fixtures::property("Drifted");
        let actor = Uuid::new_v4();
        let now = Utc::now();
        let first = PenaltyEntry::pending(now, PenaltyType::LateUpdate, 100, "late", actor, None);
        let second = PenaltyEntry::pending(
            now + Duration::seconds(1),
            PenaltyType::ContractBreach,
            1000,
            "breach",
            actor,
            None,
        );
        let second_date = second.date;
        property.penalty_history = vec![first, second];
        // rollups deliberately out of sync with the log
        property.total_penalties = 7;
        property.unpaid_penalties = 42;
        store.insert_property(&property).await.unwrap();

        let updated = service
            .update_penalty_status(
                property.id,
                UpdatePenaltyStatusDto {
                    penalty_id: None,
                    penalty_date: Some(second_date),
                    status: PenaltyStatus::Disputed,
                    updated_by: actor,
                    notes: Some("Landlord contests".to_string()),
                },
            )
            .await
            .unwrap();

        let expected: i64 = updated
            .penalty_history
            .iter()
            .filter(|p| matches!(p.status, PenaltyStatus::Pending | PenaltyStatus::Disputed))
            .map(|p| p.amount)
            .sum();
        assert_eq!(updated.unpaid_penalties, expected);
        assert_eq!(updated.unpaid_penalties, 1100);
        assert_eq!(updated.penalty_history[1].status, PenaltyStatus::Disputed);
        assert_eq!(updated.penalty_history[1].notes.as_deref(), Some("Landlord contests"));

        let paid = service
            .update_penalty_status(
                property.id,
                UpdatePenaltyStatusDto {
                    penalty_id: Some(updated.penalty_history[0].id),
                    penalty_date: None,
                    status: PenaltyStatus::Paid,
                    updated_by: actor,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.unpaid_penalties, 1000);
        assert_eq!(paid.total_penalties, 1100);
    }

    #[tokio::test]
    async fn penalty_that_would_overflow_totals_is_rejected() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        let huge = || ImposePenaltyDto {
            penalty_type: PenaltyType::ContractBreach,
            amount: i64::MAX,
            reason: "Held past the blockage period".to_string(),
            imposed_by: Uuid::new_v4(),
            notes: None,
        };

        service.impose_penalty(property.id, huge()).await.unwrap();
        let before = service.get_property(property.id).await.unwrap().property;

        let err = service.impose_penalty(property.id, huge()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let after = service.get_property(property.id).await.unwrap().property;
        assert_eq!(after, before);
        assert_eq!(after.penalty_history.len(), 1);
        assert_eq!(after.total_penalties, i64::MAX);
        assert_eq!(after.unpaid_penalties, i64::MAX);
    }

    #[tokio::test]
    async fn penalty_status_update_replaces_notes() {
        let (store, service) = service();
        let mut property = fixtures::property("Annotated");
        let actor = Uuid::new_v4();
        property
            .push_penalty(PenaltyEntry::pending(
                Utc::now(),
                PenaltyType::LateUpdate,
                100,
                "late",
                actor,
                Some("first notice".to_string()),
            ))
            .unwrap();
        let penalty_id = property.penalty_history[0].id;
        store.insert_property(&property).await.unwrap();

        let updated = service
            .update_penalty_status(
                property.id,
                UpdatePenaltyStatusDto {
                    penalty_id: Some(penalty_id),
                    penalty_date: None,
                    status: PenaltyStatus::Waived,
                    updated_by: actor,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.penalty_history[0].status, PenaltyStatus::Waived);
        assert!(updated.penalty_history[0].notes.is_none());
        assert_eq!(updated.unpaid_penalties, 0);
    }

    #[tokio::test]
    async fn penalty_status_update_without_match_fails() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let err = service
            .update_penalty_status(
                property.id,
                UpdatePenaltyStatusDto {
                    penalty_id: None,
                    penalty_date: Some(Utc::now()),
                    status: PenaltyStatus::Paid,
                    updated_by: Uuid::new_v4(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Penalty not found");
    }

    #[tokio::test]
    async fn bulk_update_settles_every_id() {
        let (store, service) = service();
        let first = service.create_property(create_body("1 Cubbon Road")).await.unwrap();
        let second = service.create_property(create_body("2 Cubbon Road")).await.unwrap();
        let missing = Uuid::new_v4();

        let response = service
            .bulk_update_stages(BulkStageDto {
                property_ids: vec![first.id.to_string(), missing.to_string(), second.id.to_string()],
                stage: PropertyStage::Requested,
                notes: None,
                updated_by: Uuid::new_v4(),
            })
            .await;

        assert!(response.success);
        assert_eq!(response.successful, 2);
        assert_eq!(response.failed, 1);
        assert_eq!(response.results[1].property_id, missing.to_string());
        assert!(!response.results[1].success);
        assert_eq!(response.results[1].error.as_deref(), Some("Property not found"));

        for id in [first.id, second.id] {
            let stored = store.get_property(id).await.unwrap().unwrap();
            assert_eq!(stored.stage, PropertyStage::Requested);
        }
    }

    #[tokio::test]
    async fn bulk_update_reports_malformed_ids() {
        let (_, service) = service();
        let response = service
            .bulk_update_stages(BulkStageDto {
                property_ids: vec!["not-a-uuid".to_string()],
                stage: PropertyStage::Sold,
                notes: None,
                updated_by: Uuid::new_v4(),
            })
            .await;

        assert_eq!(response.successful, 0);
        assert_eq!(response.failed, 1);
        assert_eq!(response.results[0].error.as_deref(), Some("Invalid property id"));
    }

    #[tokio::test]
    async fn concurrent_contact_appends_are_not_lost() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let calls = (0..2).map(|i| {
            service.add_contact(
                property.id,
                ContactDto {
                    contact_type: ContactType::Call,
                    notes: format!("call {}", i),
                    contacted_by: Uuid::new_v4(),
                    outcome: None,
                },
            )
        });
        for result in futures::future::join_all(calls).await {
            result.unwrap();
        }

        let stored = service.get_property(property.id).await.unwrap().property;
        assert_eq!(stored.contact_history.len(), 2);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn status_update_composes_stage_availability_and_check() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let outcome = service
            .update_status_with_penalty_check(
                property.id,
                UpdateStatusDto {
                    stage: PropertyStage::Sold,
                    is_available: Some(true),
                    check_violations: None,
                    notes: None,
                    updated_by: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        let report = outcome.violations.unwrap();
        assert_eq!(report.penalties_imposed, 1);
        assert_eq!(outcome.property.stage, PropertyStage::Sold);
        assert_eq!(outcome.property.unpaid_penalties, 500);
        // stage entry, availability entry, inspection entry
        assert_eq!(outcome.property.contact_history.len(), 3);
    }

    #[tokio::test]
    async fn status_update_can_skip_the_check() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();

        let outcome = service
            .update_status_with_penalty_check(
                property.id,
                UpdateStatusDto {
                    stage: PropertyStage::Sold,
                    is_available: None,
                    check_violations: Some(false),
                    notes: None,
                    updated_by: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        assert!(outcome.violations.is_none());
        assert!(outcome.property.penalty_history.is_empty());
    }

    #[tokio::test]
    async fn search_matches_fields_and_orders_by_recency() {
        let (store, service) = service();
        let mut older = fixtures::property("5 MG Road");
        older.created_at = Utc::now() - Duration::days(3);
        let newer = fixtures::property("9 MG Road");
        let mut other = fixtures::property("Whitefield Main Road");
        other.building_name = "ITPL".to_string();
        other.landlord_contact.name = "Meera".to_string();
        for p in [&older, &newer, &other] {
            store.insert_property(p).await.unwrap();
        }

        let hits = service.search_properties("mg ROAD", None).await.unwrap();
        let addresses: Vec<&str> = hits.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(addresses, vec!["9 MG Road", "5 MG Road"]);

        let by_landlord = service.search_properties("meera", None).await.unwrap();
        assert_eq!(by_landlord.len(), 1);

        let limited = service.search_properties("road", Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);

        assert!(service.search_properties("   ", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_resolves_franchise_and_franchiser() {
        let (store, service) = service();
        let now = Utc::now();
        let franchiser = Franchiser {
            id: Uuid::new_v4(),
            name: "Chai Point".to_string(),
            industry: Some("food".to_string()),
            created_at: now,
        };
        let franchise = Franchise {
            id: Uuid::new_v4(),
            franchiser_id: franchiser.id,
            name: "Chai Point Koramangala".to_string(),
            location: None,
            status: FranchiseStatus::Active,
            created_at: now,
        };
        store.insert_franchiser(&franchiser).await.unwrap();
        store.insert_franchise(&franchise).await.unwrap();

        let property = service.create_property(create_body("80 Feet Road")).await.unwrap();
        service
            .update_stage(
                property.id,
                UpdateStageDto {
                    stage: PropertyStage::Requested,
                    franchise_id: Some(franchise.id),
                    franchiser_id: None,
                    notes: None,
                    updated_by: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        let listed = service
            .get_properties(PropertyQueryDto {
                stage: Some(PropertyStage::Requested),
                ..PropertyQueryDto::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].franchise.as_ref().map(|f| f.id), Some(franchise.id));
        assert_eq!(listed[0].franchiser.as_ref().map(|f| f.id), Some(franchiser.id));
    }

    #[tokio::test]
    async fn stats_scan_whole_collection() {
        let (_, service) = service();
        let property = service.create_property(create_body("14 Lavelle Road")).await.unwrap();
        service.create_property(create_body("15 Lavelle Road")).await.unwrap();
        service
            .impose_penalty(
                property.id,
                ImposePenaltyDto {
                    penalty_type: PenaltyType::Misinformation,
                    amount: 300,
                    reason: "Wrong photos".to_string(),
                    imposed_by: Uuid::new_v4(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let stats = service.property_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unpaid_penalties, 300);

        let penalties = service.penalty_stats().await.unwrap();
        assert_eq!(penalties.total_count, 1);
        assert_eq!(penalties.properties_with_penalties, 1);
    }
}
