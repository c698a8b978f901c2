//! Buyer profile and saved-search matching.
//!
//! A pass loads active profiles and listings through the [`repository`] contract, scores
//! each candidate pair with the weighted rubric in [`scoring`], and stores at most one
//! summary notification per profile.

mod alerts;
pub mod candidates;
pub mod domain;
pub mod memory;
pub mod notifier;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use alerts::AlertRunReport;
pub use candidates::{candidates, rejected_for};
pub use domain::{
    BuyerProfile, ContactId, FeedbackId, FeedbackVerdict, ListingPreference, ListingType,
    MatchResult, Notification, NotificationId, NotificationKind, NotificationPriority,
    ProfileId, ProfileStatus, Property, PropertyFeedback, PropertyId, PropertyStatus,
    RelatedEntity, SavedSearch, SavedSearchId, SearchCriteria,
};
pub use memory::{Dataset, InMemoryStore, MemoryCollection};
pub use notifier::{top_matches, MatchNotifier, NotifyError};
pub use repository::{Entity, EntityRepository, MatchingStore, RepositoryError};
pub use router::matching_router;
pub use scoring::{
    CriterionOutcome, MatchCriterion, MatchScorer, MatchingConfig, ScoreBreakdown,
    ScoringWeights, MAX_TOTAL_WEIGHT,
};
pub use service::{
    ItemFailure, MatchRunReport, MatchingService, MatchingServiceError, NotifiedItem,
};
