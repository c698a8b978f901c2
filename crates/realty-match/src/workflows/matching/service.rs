use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::candidates::{candidates, rejected_for};
use super::domain::{
    BuyerProfile, MatchResult, Notification, NotificationId, ProfileId, Property,
    PropertyFeedback, PropertyId, SearchCriteria,
};
use super::notifier::{top_matches, MatchNotifier, NotifyError};
use super::repository::{EntityRepository, MatchingStore, RepositoryError};
use super::scoring::{MatchScorer, MatchingConfig, ScoreBreakdown};
use crate::workflows::feed::{sync_feed, FeedFormat, FeedImportError, FeedSyncReport};

/// Service composing the scorer, candidate filter, notifier, and data store.
pub struct MatchingService<S> {
    pub(crate) store: Arc<S>,
    pub(crate) scorer: MatchScorer,
    pub(crate) notifier: MatchNotifier,
    pub(crate) config: MatchingConfig,
}

impl<S> MatchingService<S>
where
    S: MatchingStore + 'static,
{
    pub fn new(store: Arc<S>, config: MatchingConfig) -> Self {
        Self {
            store,
            scorer: MatchScorer::new(config.weights),
            notifier: MatchNotifier::new(config.top_limit),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Match every active profile against every active listing and notify once per profile.
    ///
    /// Load failures abort the pass; failures for a single profile are recorded in the
    /// report and the pass moves on. The notification is stored before the profile's
    /// `last_match_date`, so a failed profile update means the next pass notifies again.
    pub fn run(&self, now: DateTime<Utc>) -> Result<MatchRunReport, MatchingServiceError> {
        let profiles = EntityRepository::<BuyerProfile>::list_where(self.store.as_ref(), |p| {
            p.is_active()
        })?;
        let properties = self.active_properties()?;
        let feedback = EntityRepository::<PropertyFeedback>::list(self.store.as_ref())?;

        let mut report = MatchRunReport::new(now);

        for profile in &profiles {
            if profile.matched_on(now) {
                debug!(profile_id = %profile.id, "profile already notified today, skipping");
                report.profiles_skipped += 1;
                continue;
            }

            report.profiles_evaluated += 1;
            match self.process_profile(profile, &properties, &feedback, now) {
                Ok(Some(notified)) => report.record(notified),
                Ok(None) => {}
                Err(error) => {
                    warn!(profile_id = %profile.id, %error, "profile matching failed");
                    report.failures.push(ItemFailure {
                        id: profile.id.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(
            profiles = report.profiles_evaluated,
            skipped = report.profiles_skipped,
            notifications = report.notifications_created,
            failures = report.failures.len(),
            "matching pass finished"
        );

        Ok(report)
    }

    fn process_profile(
        &self,
        profile: &BuyerProfile,
        properties: &[Property],
        feedback: &[PropertyFeedback],
        now: DateTime<Utc>,
    ) -> Result<Option<NotifiedItem>, ItemError> {
        let rejected = profile
            .contact_id
            .as_ref()
            .map(|contact| rejected_for(contact, feedback))
            .unwrap_or_default();

        let matches =
            self.matches_for(&profile.criteria, properties, &BTreeSet::new(), &rejected);
        if matches.is_empty() {
            return Ok(None);
        }

        let notification = self
            .notifier
            .for_profile(profile, &matches, now)?;
        let notification =
            EntityRepository::<Notification>::create(self.store.as_ref(), notification)?;

        EntityRepository::<BuyerProfile>::update(
            self.store.as_ref(),
            &profile.id,
            &|stored: &mut BuyerProfile| stored.last_match_date = Some(now),
        )?;

        Ok(Some(NotifiedItem {
            id: profile.id.to_string(),
            notification_id: notification.id,
            match_count: matches.len(),
            property_ids: matches.into_iter().map(|entry| entry.property_id).collect(),
        }))
    }

    /// Scored candidates meeting the threshold, in load order.
    pub(crate) fn matches_for(
        &self,
        criteria: &SearchCriteria,
        properties: &[Property],
        sent_ids: &BTreeSet<PropertyId>,
        rejected_ids: &BTreeSet<PropertyId>,
    ) -> Vec<MatchResult> {
        candidates(criteria, properties, sent_ids, rejected_ids)
            .into_iter()
            .map(|property| self.scorer.match_result(criteria, property))
            .filter(|result| self.config.is_match(result.score))
            .collect()
    }

    pub(crate) fn active_properties(&self) -> Result<Vec<Property>, RepositoryError> {
        EntityRepository::<Property>::list_where(self.store.as_ref(), |p| p.is_active())
    }

    /// Every candidate listing for one profile ranked by score, best first.
    pub fn ranked_matches(
        &self,
        profile_id: &ProfileId,
        limit: Option<usize>,
    ) -> Result<Vec<MatchResult>, MatchingServiceError> {
        let profile = self.profile(profile_id)?;
        let properties = self.active_properties()?;
        let feedback = EntityRepository::<PropertyFeedback>::list(self.store.as_ref())?;
        let rejected = profile
            .contact_id
            .as_ref()
            .map(|contact| rejected_for(contact, &feedback))
            .unwrap_or_default();

        let scored = candidates(&profile.criteria, &properties, &BTreeSet::new(), &rejected)
            .into_iter()
            .map(|property| self.scorer.match_result(&profile.criteria, property))
            .collect::<Vec<_>>();

        Ok(top_matches(&scored, limit.unwrap_or(scored.len())))
    }

    /// Full rubric breakdown for one (profile, listing) pair.
    pub fn score_pair(
        &self,
        profile_id: &ProfileId,
        property_id: &PropertyId,
    ) -> Result<ScoreBreakdown, MatchingServiceError> {
        if property_id.as_str().trim().is_empty() {
            return Err(MatchingServiceError::InvalidInput("property_id is required"));
        }
        let profile = self.profile(profile_id)?;
        let property = EntityRepository::<Property>::get(self.store.as_ref(), property_id)?;
        Ok(self.scorer.evaluate(&profile.criteria, &property))
    }

    /// Parse a partner feed and store the listings it adds.
    pub fn sync_feed(
        &self,
        format: FeedFormat,
        payload: &[u8],
    ) -> Result<FeedSyncReport, MatchingServiceError> {
        let report = sync_feed(self.store.as_ref(), format, payload)?;
        info!(
            created = report.created,
            duplicates = report.duplicates,
            invalid = report.invalid.len(),
            "property feed synced"
        );
        Ok(report)
    }

    fn profile(&self, profile_id: &ProfileId) -> Result<BuyerProfile, MatchingServiceError> {
        if profile_id.as_str().trim().is_empty() {
            return Err(MatchingServiceError::InvalidInput("profile_id is required"));
        }
        Ok(EntityRepository::<BuyerProfile>::get(
            self.store.as_ref(),
            profile_id,
        )?)
    }
}

/// Profile or saved search that received a notification during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifiedItem {
    pub id: String,
    pub notification_id: NotificationId,
    pub match_count: usize,
    pub property_ids: Vec<PropertyId>,
}

/// Item that could not be processed; the pass continued without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRunReport {
    pub started_at: DateTime<Utc>,
    pub profiles_evaluated: usize,
    pub profiles_skipped: usize,
    pub matches_found: usize,
    pub notifications_created: usize,
    pub notified: Vec<NotifiedItem>,
    pub failures: Vec<ItemFailure>,
}

impl MatchRunReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            profiles_evaluated: 0,
            profiles_skipped: 0,
            matches_found: 0,
            notifications_created: 0,
            notified: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record(&mut self, notified: NotifiedItem) {
        self.matches_found += notified.match_count;
        self.notifications_created += 1;
        self.notified.push(notified);
    }
}

/// Failure scoped to one profile or saved search.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ItemError {
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Feed(#[from] FeedImportError),
}
