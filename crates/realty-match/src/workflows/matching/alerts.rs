//! Saved-search alerting: the matching pass run over saved searches instead of buyer
//! profiles, suppressing listings already sent or rejected by the contact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::candidates::rejected_for;
use super::domain::{Notification, Property, PropertyFeedback, PropertyId, SavedSearch};
use super::repository::{EntityRepository, MatchingStore};
use super::service::{
    ItemError, ItemFailure, MatchingService, MatchingServiceError, NotifiedItem,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRunReport {
    pub started_at: DateTime<Utc>,
    pub searches_evaluated: usize,
    pub alerts_sent: usize,
    pub properties_sent: usize,
    pub notified: Vec<NotifiedItem>,
    pub failures: Vec<ItemFailure>,
}

impl<S> MatchingService<S>
where
    S: MatchingStore + 'static,
{
    /// Alert every active saved search about listings it has not been sent yet.
    ///
    /// The sent set is only grown after the alert is stored; if that update fails the
    /// same listings are alerted again on the next run.
    pub fn run_alerts(&self, now: DateTime<Utc>) -> Result<AlertRunReport, MatchingServiceError> {
        let searches =
            EntityRepository::<SavedSearch>::list_where(self.store.as_ref(), |s| s.active)?;
        let properties = self.active_properties()?;
        let feedback = EntityRepository::<PropertyFeedback>::list(self.store.as_ref())?;

        let mut report = AlertRunReport {
            started_at: now,
            searches_evaluated: 0,
            alerts_sent: 0,
            properties_sent: 0,
            notified: Vec::new(),
            failures: Vec::new(),
        };

        for search in &searches {
            report.searches_evaluated += 1;
            match self.process_search(search, &properties, &feedback, now) {
                Ok(Some(notified)) => {
                    report.alerts_sent += 1;
                    report.properties_sent += notified.match_count;
                    report.notified.push(notified);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(saved_search_id = %search.id, %error, "saved search alert failed");
                    report.failures.push(ItemFailure {
                        id: search.id.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(
            searches = report.searches_evaluated,
            alerts = report.alerts_sent,
            failures = report.failures.len(),
            "saved search alerts finished"
        );

        Ok(report)
    }

    fn process_search(
        &self,
        search: &SavedSearch,
        properties: &[Property],
        feedback: &[PropertyFeedback],
        now: DateTime<Utc>,
    ) -> Result<Option<NotifiedItem>, ItemError> {
        let rejected = rejected_for(&search.contact_id, feedback);
        let matches = self.matches_for(
            &search.criteria,
            properties,
            &search.sent_property_ids,
            &rejected,
        );
        if matches.is_empty() {
            return Ok(None);
        }

        let notification = self
            .notifier
            .for_saved_search(search, &matches, now)?;
        let notification =
            EntityRepository::<Notification>::create(self.store.as_ref(), notification)?;

        let sent: Vec<PropertyId> = matches.iter().map(|m| m.property_id.clone()).collect();
        EntityRepository::<SavedSearch>::update(
            self.store.as_ref(),
            &search.id,
            &|stored: &mut SavedSearch| {
                stored.record_sent(&sent);
                stored.last_alert_at = Some(now);
            },
        )?;

        Ok(Some(NotifiedItem {
            id: search.id.to_string(),
            notification_id: notification.id,
            match_count: matches.len(),
            property_ids: sent,
        }))
    }
}
