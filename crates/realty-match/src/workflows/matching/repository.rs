use std::fmt;

use super::domain::{
    BuyerProfile, FeedbackId, Notification, NotificationId, ProfileId, Property, PropertyFeedback,
    PropertyId, SavedSearch, SavedSearchId,
};

/// Record stored in one of the CRM's entity collections.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const COLLECTION: &'static str;

    /// Prefix of ids the store allocates for records created without one.
    /// `None` means callers always supply the id.
    const ASSIGNED_ID_PREFIX: Option<&'static str> = None;

    fn id(&self) -> &Self::Id;

    /// Whether the store should allocate an id on create.
    fn needs_id(&self) -> bool {
        false
    }

    fn assign_id(&mut self, _id: String) {}
}

impl Entity for BuyerProfile {
    type Id = ProfileId;
    const COLLECTION: &'static str = "BuyerProfile";

    fn id(&self) -> &ProfileId {
        &self.id
    }
}

impl Entity for Property {
    type Id = PropertyId;
    const COLLECTION: &'static str = "Property";
    const ASSIGNED_ID_PREFIX: Option<&'static str> = Some("prop-");

    fn id(&self) -> &PropertyId {
        &self.id
    }

    fn needs_id(&self) -> bool {
        self.id.is_unassigned()
    }

    fn assign_id(&mut self, id: String) {
        self.id = PropertyId(id);
    }
}

impl Entity for Notification {
    type Id = NotificationId;
    const COLLECTION: &'static str = "Notification";
    const ASSIGNED_ID_PREFIX: Option<&'static str> = Some("ntf-");

    fn id(&self) -> &NotificationId {
        &self.id
    }

    fn needs_id(&self) -> bool {
        self.id.is_unassigned()
    }

    fn assign_id(&mut self, id: String) {
        self.id = NotificationId(id);
    }
}

impl Entity for SavedSearch {
    type Id = SavedSearchId;
    const COLLECTION: &'static str = "SavedSearchCriteria";

    fn id(&self) -> &SavedSearchId {
        &self.id
    }
}

impl Entity for PropertyFeedback {
    type Id = FeedbackId;
    const COLLECTION: &'static str = "PropertyFeedback";

    fn id(&self) -> &FeedbackId {
        &self.id
    }
}

/// Generic data-access contract for a single entity collection.
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Every record in the collection, in storage order.
    fn list(&self) -> Result<Vec<E>, RepositoryError>;

    fn get(&self, id: &E::Id) -> Result<E, RepositoryError>;

    /// Stores a new record and returns it with its final id. Entities with an
    /// [`Entity::ASSIGNED_ID_PREFIX`] created with a blank id get the next free one.
    fn create(&self, record: E) -> Result<E, RepositoryError>;

    /// Applies `patch` to the stored record and returns the updated copy.
    fn update(&self, id: &E::Id, patch: &dyn Fn(&mut E)) -> Result<E, RepositoryError>;

    fn list_where<F>(&self, predicate: F) -> Result<Vec<E>, RepositoryError>
    where
        F: Fn(&E) -> bool,
        Self: Sized,
    {
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }
}

/// Every collection the matching passes read or write.
pub trait MatchingStore:
    EntityRepository<BuyerProfile>
    + EntityRepository<Property>
    + EntityRepository<Notification>
    + EntityRepository<SavedSearch>
    + EntityRepository<PropertyFeedback>
{
}

impl<T> MatchingStore for T where
    T: EntityRepository<BuyerProfile>
        + EntityRepository<Property>
        + EntityRepository<Notification>
        + EntityRepository<SavedSearch>
        + EntityRepository<PropertyFeedback>
{
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{collection} {id} already exists")]
    Conflict { collection: &'static str, id: String },
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found<E: Entity>(id: &E::Id) -> Self {
        Self::NotFound {
            collection: E::COLLECTION,
            id: id.to_string(),
        }
    }

    pub fn conflict<E: Entity>(id: &E::Id) -> Self {
        Self::Conflict {
            collection: E::COLLECTION,
            id: id.to_string(),
        }
    }
}
