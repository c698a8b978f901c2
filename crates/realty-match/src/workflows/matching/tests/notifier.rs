use super::common::*;

use crate::workflows::matching::{
    top_matches, MatchNotifier, MatchResult, NotificationKind,
    NotificationPriority, NotifyError, PropertyId, RelatedEntity,
};

fn scored(id: &str, score: u8) -> MatchResult {
    MatchResult {
        property_id: PropertyId::new(id),
        property_title: format!("Listing {id}"),
        score,
    }
}

#[test]
fn top_matches_orders_by_score_and_keeps_ties_stable() {
    let matches = vec![
        scored("p-1", 72),
        scored("p-2", 95),
        scored("p-3", 72),
        scored("p-4", 88),
    ];

    let top = top_matches(&matches, 3);

    let order: Vec<_> = top.iter().map(|m| m.property_id.to_string()).collect();
    assert_eq!(order, vec!["p-2", "p-4", "p-1"]);
}

#[test]
fn profile_notification_quotes_top_three() {
    let notifier = MatchNotifier::new(3);
    let buyer = profile("bp-1", lisbon_criteria());
    let matches = vec![
        scored("p-1", 71),
        scored("p-2", 100),
        scored("p-3", 76),
        scored("p-4", 80),
    ];

    let notification = notifier
        .for_profile(&buyer, &matches, now())
        .expect("notification built");

    assert_eq!(notification.kind, NotificationKind::PropertyMatch);
    assert_eq!(notification.related_type, RelatedEntity::BuyerProfile);
    assert_eq!(notification.related_id, "bp-1");
    assert_eq!(notification.user_email, "agent@realty.test");
    assert_eq!(notification.priority, NotificationPriority::High);
    assert!(!notification.is_read);
    assert!(notification.id.is_unassigned());
    assert_eq!(notification.created_at, now());
    assert_eq!(notification.title, "New property matches for Buyer bp-1");
    assert!(notification
        .message
        .ends_with("Top: Listing p-2 (100%), Listing p-4 (80%), Listing p-3 (76%)"));
    assert_eq!(notification.metadata["match_count"], 4);
    let top = notification.metadata["top_matches"]
        .as_array()
        .expect("top matches array");
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["property_id"], "p-2");
    assert_eq!(top[2]["score"], 76);
}

#[test]
fn middling_best_score_is_medium_priority() {
    let notifier = MatchNotifier::new(3);
    let buyer = profile("bp-1", lisbon_criteria());

    let notification = notifier
        .for_profile(&buyer, &[scored("p-1", 89)], now())
        .expect("notification built");

    assert_eq!(notification.priority, NotificationPriority::Medium);
}

#[test]
fn recipient_falls_back_to_creator() {
    let notifier = MatchNotifier::new(3);
    let mut buyer = profile("bp-1", lisbon_criteria());
    buyer.assigned_agent_email = Some("   ".to_string());

    let notification = notifier
        .for_profile(&buyer, &[scored("p-1", 90)], now())
        .expect("notification built");

    assert_eq!(notification.user_email, "owner@realty.test");
}

#[test]
fn missing_recipient_is_an_error() {
    let notifier = MatchNotifier::new(3);
    let mut buyer = profile("bp-1", lisbon_criteria());
    buyer.assigned_agent_email = None;
    buyer.created_by = None;

    let error = notifier
        .for_profile(&buyer, &[scored("p-1", 90)], now())
        .expect_err("no recipient");

    assert!(matches!(error, NotifyError::NoRecipient { .. }));
}

#[test]
fn empty_match_list_is_rejected() {
    let notifier = MatchNotifier::new(3);
    let search = saved_search("ss-1", "c-1", lisbon_criteria());

    let error = notifier
        .for_saved_search(&search, &[], now())
        .expect_err("nothing to send");

    assert_eq!(error, NotifyError::NoMatches);
}

#[test]
fn saved_search_alert_names_the_search() {
    let notifier = MatchNotifier::new(3);
    let search = saved_search("ss-1", "c-1", lisbon_criteria());

    let notification = notifier
        .for_saved_search(&search, &[scored("p-1", 75)], now())
        .expect("alert built");

    assert_eq!(notification.kind, NotificationKind::SearchAlert);
    assert_eq!(notification.related_type, RelatedEntity::SavedSearch);
    assert_eq!(notification.title, "New listings for saved search 'Search ss-1'");
    assert_eq!(notification.priority, NotificationPriority::Medium);
}
