use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::domain::{BuyerProfile, Notification, Property, PropertyFeedback, SavedSearch};
use super::repository::{Entity, EntityRepository, RepositoryError};

/// Insertion-ordered collection guarded by a mutex.
#[derive(Debug)]
pub struct MemoryCollection<E> {
    records: Mutex<Vec<E>>,
}

impl<E> Default for MemoryCollection<E> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Entity> MemoryCollection<E> {
    pub fn new(records: Vec<E>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<E>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable(format!("{} lock poisoned", E::COLLECTION)))
    }

    pub fn list(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    pub fn get(&self, id: &E::Id) -> Result<E, RepositoryError> {
        self.lock()?
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found::<E>(id))
    }

    pub fn create(&self, mut record: E) -> Result<E, RepositoryError> {
        let mut guard = self.lock()?;
        if let Some(prefix) = E::ASSIGNED_ID_PREFIX.filter(|_| record.needs_id()) {
            record.assign_id(next_assigned_id(&guard, prefix));
        }
        if guard.iter().any(|existing| existing.id() == record.id()) {
            return Err(RepositoryError::conflict::<E>(record.id()));
        }
        guard.push(record.clone());
        Ok(record)
    }

    pub fn update(&self, id: &E::Id, patch: &dyn Fn(&mut E)) -> Result<E, RepositoryError> {
        let mut guard = self.lock()?;
        let record = guard
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| RepositoryError::not_found::<E>(id))?;
        patch(record);
        Ok(record.clone())
    }
}

/// One past the highest `<prefix><number>` id already stored, zero padded to six digits.
fn next_assigned_id<E: Entity>(records: &[E], prefix: &str) -> String {
    let highest = records
        .iter()
        .filter_map(|record| {
            let id = record.id().to_string();
            id.strip_prefix(prefix)?.parse::<u64>().ok()
        })
        .max()
        .unwrap_or(0);
    format!("{prefix}{:06}", highest + 1)
}

/// Serializable snapshot of every collection, used to seed or dump an [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub profiles: Vec<BuyerProfile>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub saved_searches: Vec<SavedSearch>,
    #[serde(default)]
    pub feedback: Vec<PropertyFeedback>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Process-local store backing the HTTP service, CLI runs, and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: MemoryCollection<BuyerProfile>,
    properties: MemoryCollection<Property>,
    saved_searches: MemoryCollection<SavedSearch>,
    feedback: MemoryCollection<PropertyFeedback>,
    notifications: MemoryCollection<Notification>,
}

impl InMemoryStore {
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            profiles: MemoryCollection::new(dataset.profiles),
            properties: MemoryCollection::new(dataset.properties),
            saved_searches: MemoryCollection::new(dataset.saved_searches),
            feedback: MemoryCollection::new(dataset.feedback),
            notifications: MemoryCollection::new(dataset.notifications),
        }
    }

    pub fn snapshot(&self) -> Result<Dataset, RepositoryError> {
        Ok(Dataset {
            profiles: self.profiles.list()?,
            properties: self.properties.list()?,
            saved_searches: self.saved_searches.list()?,
            feedback: self.feedback.list()?,
            notifications: self.notifications.list()?,
        })
    }
}

/// Resolves the collection holding entities of type `E`.
pub trait CollectionOf<E> {
    fn collection(&self) -> &MemoryCollection<E>;
}

impl CollectionOf<BuyerProfile> for InMemoryStore {
    fn collection(&self) -> &MemoryCollection<BuyerProfile> {
        &self.profiles
    }
}

impl CollectionOf<Property> for InMemoryStore {
    fn collection(&self) -> &MemoryCollection<Property> {
        &self.properties
    }
}

impl CollectionOf<SavedSearch> for InMemoryStore {
    fn collection(&self) -> &MemoryCollection<SavedSearch> {
        &self.saved_searches
    }
}

impl CollectionOf<PropertyFeedback> for InMemoryStore {
    fn collection(&self) -> &MemoryCollection<PropertyFeedback> {
        &self.feedback
    }
}

impl CollectionOf<Notification> for InMemoryStore {
    fn collection(&self) -> &MemoryCollection<Notification> {
        &self.notifications
    }
}

impl<E> EntityRepository<E> for InMemoryStore
where
    E: Entity,
    InMemoryStore: CollectionOf<E>,
{
    fn list(&self) -> Result<Vec<E>, RepositoryError> {
        <Self as CollectionOf<E>>::collection(self).list()
    }

    fn get(&self, id: &E::Id) -> Result<E, RepositoryError> {
        <Self as CollectionOf<E>>::collection(self).get(id)
    }

    fn create(&self, record: E) -> Result<E, RepositoryError> {
        <Self as CollectionOf<E>>::collection(self).create(record)
    }

    fn update(&self, id: &E::Id, patch: &dyn Fn(&mut E)) -> Result<E, RepositoryError> {
        <Self as CollectionOf<E>>::collection(self).update(id, patch)
    }
}
