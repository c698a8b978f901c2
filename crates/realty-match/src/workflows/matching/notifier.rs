use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use super::domain::{
    BuyerProfile, MatchResult, Notification, NotificationId, NotificationKind,
    NotificationPriority, RelatedEntity, SavedSearch,
};

/// Best score at which a notification is flagged high priority.
const HIGH_PRIORITY_SCORE: u8 = 90;

/// Notification build failures for a single profile or saved search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("no matches to notify about")]
    NoMatches,
    #[error("{related} has neither an assigned agent nor an owner to notify")]
    NoRecipient { related: String },
}

/// Highest scoring matches first; equal scores keep their input order.
pub fn top_matches(matches: &[MatchResult], limit: usize) -> Vec<MatchResult> {
    let mut ranked = matches.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

/// Builds the single summary notification sent per profile or saved search.
/// Notifications leave here without an id; the store assigns one on create.
#[derive(Debug, Clone)]
pub struct MatchNotifier {
    top_limit: usize,
}

impl MatchNotifier {
    pub fn new(top_limit: usize) -> Self {
        Self {
            top_limit: top_limit.max(1),
        }
    }

    pub fn for_profile(
        &self,
        profile: &BuyerProfile,
        matches: &[MatchResult],
        now: DateTime<Utc>,
    ) -> Result<Notification, NotifyError> {
        let recipient = profile.recipient().ok_or_else(|| NotifyError::NoRecipient {
            related: format!("profile {}", profile.id),
        })?;

        let title = format!("New property matches for {}", profile.buyer_name);
        let lead = format!(
            "{} listing(s) match the search of {}",
            matches.len(),
            profile.buyer_name
        );

        self.build(
            Draft {
                kind: NotificationKind::PropertyMatch,
                related_type: RelatedEntity::BuyerProfile,
                related_id: profile.id.to_string(),
                recipient,
                title,
                lead,
            },
            matches,
            now,
        )
    }

    pub fn for_saved_search(
        &self,
        search: &SavedSearch,
        matches: &[MatchResult],
        now: DateTime<Utc>,
    ) -> Result<Notification, NotifyError> {
        let recipient = search.recipient().ok_or_else(|| NotifyError::NoRecipient {
            related: format!("saved search {}", search.id),
        })?;

        let title = format!("New listings for saved search '{}'", search.name);
        let lead = format!(
            "{} new listing(s) for contact {} since the last alert",
            matches.len(),
            search.contact_id
        );

        self.build(
            Draft {
                kind: NotificationKind::SearchAlert,
                related_type: RelatedEntity::SavedSearch,
                related_id: search.id.to_string(),
                recipient,
                title,
                lead,
            },
            matches,
            now,
        )
    }

    fn build(
        &self,
        draft: Draft<'_>,
        matches: &[MatchResult],
        now: DateTime<Utc>,
    ) -> Result<Notification, NotifyError> {
        let top = top_matches(matches, self.top_limit);
        let best = top.first().ok_or(NotifyError::NoMatches)?;

        let priority = if best.score >= HIGH_PRIORITY_SCORE {
            NotificationPriority::High
        } else {
            NotificationPriority::Medium
        };

        let highlights = top
            .iter()
            .map(|entry| format!("{} ({}%)", entry.property_title, entry.score))
            .collect::<Vec<_>>()
            .join(", ");

        let mut metadata = Map::new();
        metadata.insert("match_count".to_string(), json!(matches.len()));
        metadata.insert(
            "top_matches".to_string(),
            Value::Array(
                top.iter()
                    .map(|entry| {
                        json!({
                            "property_id": entry.property_id,
                            "property_title": entry.property_title,
                            "score": entry.score,
                        })
                    })
                    .collect(),
            ),
        );

        Ok(Notification {
            id: NotificationId::default(),
            title: draft.title,
            message: format!("{}. Top: {highlights}", draft.lead),
            kind: draft.kind,
            priority,
            user_email: draft.recipient.to_string(),
            related_type: draft.related_type,
            related_id: draft.related_id,
            metadata,
            is_read: false,
            created_at: now,
        })
    }
}

struct Draft<'a> {
    kind: NotificationKind,
    related_type: RelatedEntity,
    related_id: String,
    recipient: &'a str,
    title: String,
    lead: String,
}
