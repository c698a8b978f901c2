use super::common::*;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;

use crate::workflows::matching::memory::Dataset;
use crate::workflows::matching::{
    EntityRepository, MatchingConfig, MatchingService, NotificationKind, Property, PropertyId,
    SavedSearch, SavedSearchId,
};

fn alert_dataset() -> Dataset {
    let mut dataset = lisbon_dataset();
    dataset.profiles.clear();
    dataset.saved_searches = vec![
        saved_search("ss-1", "c-1", lisbon_criteria()),
        saved_search("ss-2", "c-2", lisbon_criteria()),
    ];
    dataset
}

fn sent_ids(search: &SavedSearch) -> Vec<String> {
    search
        .sent_property_ids
        .iter()
        .map(|id| id.to_string())
        .collect()
}

#[test]
fn alerts_send_unseen_matches_and_remember_them() {
    let (service, store) = build_service(alert_dataset());

    let report = service.run_alerts(now()).expect("alerts run");

    assert_eq!(report.searches_evaluated, 2);
    assert_eq!(report.alerts_sent, 2);
    assert_eq!(report.properties_sent, 6);
    assert!(report.failures.is_empty());

    let search = stored_search(&store, "ss-1");
    assert_eq!(sent_ids(&search), vec!["p-1", "p-2", "p-3"]);
    assert_eq!(search.last_alert_at, Some(now()));
    assert!(notifications(&store)
        .iter()
        .all(|n| n.kind == NotificationKind::SearchAlert));
}

#[test]
fn rerunning_alerts_sends_nothing_new() {
    let (service, store) = build_service(alert_dataset());

    service.run_alerts(now()).expect("first run");
    let before = stored_search(&store, "ss-1").sent_property_ids;
    let report = service
        .run_alerts(now() + Duration::minutes(5))
        .expect("second run");

    assert_eq!(report.alerts_sent, 0);
    assert_eq!(report.properties_sent, 0);
    assert_eq!(notifications(&store).len(), 2);
    assert_eq!(stored_search(&store, "ss-1").sent_property_ids, before);
    assert_eq!(stored_search(&store, "ss-1").last_alert_at, Some(now()));
}

#[test]
fn only_new_listings_are_alerted_later() {
    let (service, store) = build_service(alert_dataset());
    service.run_alerts(now()).expect("first run");

    let mut fresh = property("p-9", "apartment", 250_000, "Lisboa");
    fresh.title = "T3 Campo de Ourique".to_string();
    EntityRepository::<Property>::create(store.as_ref(), fresh).expect("listing stored");

    let report = service
        .run_alerts(now() + Duration::hours(1))
        .expect("second run");

    assert_eq!(report.alerts_sent, 2);
    assert_eq!(report.notified[0].property_ids, vec![PropertyId::new("p-9")]);
    assert_eq!(stored_search(&store, "ss-1").sent_property_ids.len(), 4);
}

#[test]
fn rejected_listings_are_never_alerted() {
    let mut dataset = alert_dataset();
    dataset.feedback = vec![rejection("c-1", "p-1"), rejection("c-1", "p-2")];
    let (service, store) = build_service(dataset);

    service.run_alerts(now()).expect("alerts run");

    assert_eq!(sent_ids(&stored_search(&store, "ss-1")), vec!["p-3"]);
    assert_eq!(stored_search(&store, "ss-2").sent_property_ids.len(), 3);
}

#[test]
fn inactive_searches_are_skipped() {
    let mut dataset = alert_dataset();
    dataset.saved_searches[1].active = false;
    let (service, store) = build_service(dataset);

    let report = service.run_alerts(now()).expect("alerts run");

    assert_eq!(report.searches_evaluated, 1);
    assert!(stored_search(&store, "ss-2").sent_property_ids.is_empty());
}

#[test]
fn failed_alert_leaves_sent_set_untouched() {
    let store = Arc::new(FlakyStore::new(alert_dataset(), &["ss-1"]));
    let service = MatchingService::new(store.clone(), MatchingConfig::default());

    let report = service.run_alerts(now()).expect("alerts run");

    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "ss-1");

    let failed = EntityRepository::<SavedSearch>::get(&store.inner, &SavedSearchId::new("ss-1"))
        .expect("search stored");
    assert_eq!(failed.sent_property_ids, BTreeSet::new());
    assert_eq!(failed.last_alert_at, None);
}

#[test]
fn failed_sent_set_update_keeps_the_alert_and_resends_later() {
    let store =
        Arc::new(FlakyStore::new(alert_dataset(), &[]).with_failing_updates(&["ss-1"]));
    let service = MatchingService::new(store.clone(), MatchingConfig::default());

    let report = service.run_alerts(now()).expect("alerts run");

    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.failures[0].id, "ss-1");
    let stored = notifications(&store.inner);
    assert!(stored.iter().any(|n| n.related_id == "ss-1"));
    assert!(stored_search(&store.inner, "ss-1").sent_property_ids.is_empty());

    let rerun = service.run_alerts(now()).expect("alerts rerun");
    assert_eq!(rerun.failures.len(), 1);
    assert_eq!(rerun.alerts_sent, 0);
    let alerts_for_ss1 = notifications(&store.inner)
        .into_iter()
        .filter(|n| n.related_id == "ss-1")
        .count();
    assert_eq!(alerts_for_ss1, 2);
}
