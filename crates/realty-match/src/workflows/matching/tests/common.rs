use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::matching::domain::{
    BuyerProfile, ContactId, FeedbackId, FeedbackVerdict, ListingPreference, ListingType,
    Notification, NotificationId, NotificationKind, NotificationPriority, ProfileId,
    ProfileStatus, Property, PropertyFeedback, PropertyId, PropertyStatus, RelatedEntity,
    SavedSearch, SavedSearchId, SearchCriteria,
};
use crate::workflows::matching::memory::{Dataset, InMemoryStore};
use crate::workflows::matching::repository::{EntityRepository, RepositoryError};
use crate::workflows::matching::{matching_router, MatchingConfig, MatchingService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 6, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn lisbon_criteria() -> SearchCriteria {
    SearchCriteria {
        property_types: BTreeSet::from(["apartment".to_string()]),
        locations: vec!["Lisboa".to_string()],
        budget_min: Some(100_000),
        budget_max: Some(300_000),
        ..SearchCriteria::default()
    }
}

pub(super) fn profile(id: &str, criteria: SearchCriteria) -> BuyerProfile {
    BuyerProfile {
        id: ProfileId::new(id),
        buyer_name: format!("Buyer {id}"),
        contact_id: Some(ContactId::new(format!("contact-{id}"))),
        assigned_agent_email: Some("agent@realty.test".to_string()),
        created_by: Some("owner@realty.test".to_string()),
        status: ProfileStatus::Active,
        criteria,
        last_match_date: None,
    }
}

pub(super) fn property(id: &str, property_type: &str, price: u64, city: &str) -> Property {
    Property {
        id: PropertyId::new(id),
        title: format!("Listing {id}"),
        external_ref: None,
        property_type: property_type.to_string(),
        listing_type: ListingType::Sale,
        price,
        city: city.to_string(),
        address: format!("Rua {id}"),
        bedrooms: 2,
        useful_area: Some(80.0),
        gross_area: None,
        square_feet: None,
        status: PropertyStatus::Active,
    }
}

pub(super) fn saved_search(id: &str, contact: &str, criteria: SearchCriteria) -> SavedSearch {
    SavedSearch {
        id: SavedSearchId::new(id),
        name: format!("Search {id}"),
        contact_id: ContactId::new(contact),
        agent_email: Some("agent@realty.test".to_string()),
        created_by: None,
        active: true,
        criteria,
        sent_property_ids: BTreeSet::new(),
        last_alert_at: None,
    }
}

pub(super) fn rejection(contact: &str, property_id: &str) -> PropertyFeedback {
    PropertyFeedback {
        id: FeedbackId::new(format!("fb-{contact}-{property_id}")),
        contact_id: ContactId::new(contact),
        property_id: PropertyId::new(property_id),
        verdict: FeedbackVerdict::Rejected,
    }
}

/// Notification left behind by an earlier run, as loaded from a persisted dataset.
pub(super) fn earlier_notification(id: &str, related_id: &str) -> Notification {
    Notification {
        id: NotificationId::new(id),
        title: "Earlier matches".to_string(),
        message: "Sent by a previous run".to_string(),
        kind: NotificationKind::PropertyMatch,
        priority: NotificationPriority::Medium,
        user_email: "agent@realty.test".to_string(),
        related_type: RelatedEntity::BuyerProfile,
        related_id: related_id.to_string(),
        metadata: Default::default(),
        is_read: true,
        created_at: now() - Duration::days(1),
    }
}

/// Two Lisbon apartment hunters and a mix of listings; both profiles match
/// `p-1`, `p-2`, and `p-3` at or above the default threshold.
pub(super) fn lisbon_dataset() -> Dataset {
    let mut renter = profile("bp-2", lisbon_criteria());
    renter.criteria.bedrooms_min = Some(2);

    let mut p2 = property("p-2", "apartment", 320_000, "Lisboa");
    p2.title = "T2 Estrela".to_string();
    let mut p3 = property("p-3", "apartment", 150_000, "Porto");
    p3.title = "T1 Bonfim".to_string();
    let mut sold = property("p-sold", "apartment", 200_000, "Lisboa");
    sold.status = PropertyStatus::Sold;
    let mut rental = property("p-rent", "apartment", 1_200, "Porto");
    rental.listing_type = ListingType::Rent;

    Dataset {
        profiles: vec![profile("bp-1", lisbon_criteria()), renter],
        properties: vec![
            property("p-1", "apartment", 200_000, "Lisboa"),
            p2,
            p3,
            property("p-4", "house", 200_000, "Lisboa"),
            sold,
            rental,
        ],
        ..Dataset::default()
    }
}

pub(super) fn sale_only(mut criteria: SearchCriteria) -> SearchCriteria {
    criteria.listing_type = ListingPreference::Sale;
    criteria
}

pub(super) fn build_service(
    dataset: Dataset,
) -> (MatchingService<InMemoryStore>, Arc<InMemoryStore>) {
    build_service_with(dataset, MatchingConfig::default())
}

pub(super) fn build_service_with(
    dataset: Dataset,
    config: MatchingConfig,
) -> (MatchingService<InMemoryStore>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let service = MatchingService::new(store.clone(), config);
    (service, store)
}

pub(super) fn notifications(store: &InMemoryStore) -> Vec<Notification> {
    EntityRepository::<Notification>::list(store).expect("notifications listed")
}

pub(super) fn stored_profile(store: &InMemoryStore, id: &str) -> BuyerProfile {
    EntityRepository::<BuyerProfile>::get(store, &ProfileId::new(id)).expect("profile stored")
}

pub(super) fn stored_search(store: &InMemoryStore, id: &str) -> SavedSearch {
    EntityRepository::<SavedSearch>::get(store, &SavedSearchId::new(id)).expect("search stored")
}

/// Store whose notification writes fail for selected related ids, and whose
/// record updates fail for selected record ids.
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryStore,
    pub(super) failing_related_ids: Vec<String>,
    pub(super) failing_updates: Vec<String>,
}

impl FlakyStore {
    pub(super) fn new(dataset: Dataset, failing_related_ids: &[&str]) -> Self {
        Self {
            inner: InMemoryStore::from_dataset(dataset),
            failing_related_ids: failing_related_ids.iter().map(|id| id.to_string()).collect(),
            failing_updates: Vec::new(),
        }
    }

    pub(super) fn with_failing_updates(mut self, ids: &[&str]) -> Self {
        self.failing_updates = ids.iter().map(|id| id.to_string()).collect();
        self
    }
}

macro_rules! delegate_to_inner {
    ($($entity:ty),*) => {
        $(
            impl EntityRepository<$entity> for FlakyStore {
                fn list(&self) -> Result<Vec<$entity>, RepositoryError> {
                    EntityRepository::<$entity>::list(&self.inner)
                }

                fn get(
                    &self,
                    id: &<$entity as crate::workflows::matching::Entity>::Id,
                ) -> Result<$entity, RepositoryError> {
                    EntityRepository::<$entity>::get(&self.inner, id)
                }

                fn create(&self, record: $entity) -> Result<$entity, RepositoryError> {
                    EntityRepository::<$entity>::create(&self.inner, record)
                }

                fn update(
                    &self,
                    id: &<$entity as crate::workflows::matching::Entity>::Id,
                    patch: &dyn Fn(&mut $entity),
                ) -> Result<$entity, RepositoryError> {
                    if self.failing_updates.contains(&id.to_string()) {
                        return Err(RepositoryError::Unavailable(
                            "record update rejected".to_string(),
                        ));
                    }
                    EntityRepository::<$entity>::update(&self.inner, id, patch)
                }
            }
        )*
    };
}

delegate_to_inner!(BuyerProfile, Property, SavedSearch, PropertyFeedback);

impl EntityRepository<Notification> for FlakyStore {
    fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        EntityRepository::<Notification>::list(&self.inner)
    }

    fn get(
        &self,
        id: &crate::workflows::matching::NotificationId,
    ) -> Result<Notification, RepositoryError> {
        EntityRepository::<Notification>::get(&self.inner, id)
    }

    fn create(&self, record: Notification) -> Result<Notification, RepositoryError> {
        if self.failing_related_ids.contains(&record.related_id) {
            return Err(RepositoryError::Unavailable(
                "notification store timed out".to_string(),
            ));
        }
        EntityRepository::<Notification>::create(&self.inner, record)
    }

    fn update(
        &self,
        id: &crate::workflows::matching::NotificationId,
        patch: &dyn Fn(&mut Notification),
    ) -> Result<Notification, RepositoryError> {
        EntityRepository::<Notification>::update(&self.inner, id, patch)
    }
}

/// Store whose every call fails, for load-failure paths.
pub(super) struct OfflineStore;

macro_rules! offline {
    ($($entity:ty),*) => {
        $(
            impl EntityRepository<$entity> for OfflineStore {
                fn list(&self) -> Result<Vec<$entity>, RepositoryError> {
                    Err(RepositoryError::Unavailable("database offline".to_string()))
                }

                fn get(
                    &self,
                    _id: &<$entity as crate::workflows::matching::Entity>::Id,
                ) -> Result<$entity, RepositoryError> {
                    Err(RepositoryError::Unavailable("database offline".to_string()))
                }

                fn create(&self, _record: $entity) -> Result<$entity, RepositoryError> {
                    Err(RepositoryError::Unavailable("database offline".to_string()))
                }

                fn update(
                    &self,
                    _id: &<$entity as crate::workflows::matching::Entity>::Id,
                    _patch: &dyn Fn(&mut $entity),
                ) -> Result<$entity, RepositoryError> {
                    Err(RepositoryError::Unavailable("database offline".to_string()))
                }
            }
        )*
    };
}

offline!(BuyerProfile, Property, SavedSearch, PropertyFeedback, Notification);

pub(super) fn router_for(dataset: Dataset) -> axum::Router {
    let (service, _) = build_service(dataset);
    matching_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
