use crate::infra::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::Args;
use realty_match::error::AppError;
use realty_match::workflows::feed::FeedFormat;
use realty_match::workflows::matching::{
    BuyerProfile, ContactId, Dataset, EntityRepository, FeedbackId, FeedbackVerdict,
    InMemoryStore, ListingPreference, ListingType, MatchingConfig, MatchingService, Notification,
    ProfileId, ProfileStatus, Property, PropertyFeedback, PropertyId, PropertyStatus, SavedSearch,
    SavedSearchId, SearchCriteria,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Skip the saved-search alert portion of the demo.
    #[arg(long)]
    pub(crate) skip_alerts: bool,
    /// Print the scoring breakdown for a sample rental match.
    #[arg(long)]
    pub(crate) show_breakdown: bool,
}

const DEMO_FEED: &str = "external_ref,title,property_type,listing_type,price,city,address,bedrooms,useful_area\n\
FEED-101,T2 Campo de Ourique,apartment,sale,335000,Lisboa,Rua Ferreira Borges 40,2,82\n\
FEED-102,Moradia Birre,house,sale,780000,Cascais,Rua das Flores 3,4,210\n\
FEED-103,T1 sem preço,apartment,sale,,Lisboa,Rua Sem Nome 1,1,40\n\
LX-001,T2 Alvalade (relisted),apartment,sale,320000,Lisboa,Av. da Igreja 4,2,85\n";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        now,
        skip_alerts,
        show_breakdown,
    } = args;
    let now = now.unwrap_or_else(Utc::now);

    let dataset = demo_dataset();
    println!("Realty match demo ({})", now.format("%Y-%m-%d %H:%M UTC"));
    println!(
        "- {} buyer profiles | {} listings | {} saved searches | {} feedback entries",
        dataset.profiles.len(),
        dataset.properties.len(),
        dataset.saved_searches.len(),
        dataset.feedback.len()
    );

    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let service = MatchingService::new(store.clone(), MatchingConfig::default());

    println!("\nPartner feed sync");
    let feed = service.sync_feed(FeedFormat::Csv, DEMO_FEED.as_bytes())?;
    println!(
        "- {} rows received | {} created | {} duplicates",
        feed.received, feed.created, feed.duplicates
    );
    for problem in &feed.invalid {
        println!("  - skipped {problem}");
    }

    println!("\nProfile matching pass");
    let report = service.run(now)?;
    println!(
        "- {} profiles evaluated | {} matches | {} notifications",
        report.profiles_evaluated, report.matches_found, report.notifications_created
    );
    print_notifications(&store, |n| n.related_id.starts_with("bp-"))?;
    for failure in &report.failures {
        println!("  ! {}: {}", failure.id, failure.error);
    }

    let rerun = service.run(now)?;
    println!(
        "- Same-day rerun: {} skipped, {} new notifications",
        rerun.profiles_skipped, rerun.notifications_created
    );

    if !skip_alerts {
        println!("\nSaved search alerts");
        let alerts = service.run_alerts(now)?;
        println!(
            "- {} searches evaluated | {} alerts | {} listings sent",
            alerts.searches_evaluated, alerts.alerts_sent, alerts.properties_sent
        );
        print_notifications(&store, |n| n.related_id.starts_with("ss-"))?;

        let repeat = service.run_alerts(now)?;
        println!(
            "- Repeat alert run: {} alerts ({} listings already sent are suppressed)",
            repeat.alerts_sent, alerts.properties_sent
        );
    }

    if show_breakdown {
        let breakdown =
            service.score_pair(&ProfileId::new("bp-ines"), &PropertyId::new("LX-004"))?;
        println!(
            "\nScore breakdown bp-ines x LX-004: {} ({} of {} weight)",
            breakdown.score, breakdown.satisfied_weight, breakdown.declared_weight
        );
        for component in &breakdown.components {
            let mark = if component.satisfied { "+" } else { "-" };
            println!(
                "  {mark} {:?} ({}): {}",
                component.criterion, component.weight, component.notes
            );
        }
    }

    Ok(())
}

fn print_notifications<F>(store: &InMemoryStore, keep: F) -> Result<(), AppError>
where
    F: Fn(&Notification) -> bool,
{
    let notifications = EntityRepository::<Notification>::list_where(store, keep)?;
    for notification in notifications {
        println!(
            "  - [{:?}] {} -> {}",
            notification.priority, notification.title, notification.user_email
        );
        println!("    {}", notification.message);
    }
    Ok(())
}

fn demo_dataset() -> Dataset {
    Dataset {
        profiles: vec![
            profile(
                "bp-ana",
                "Ana Costa",
                Some("rita@agency.test"),
                SearchCriteria {
                    property_types: types(&["apartment"]),
                    locations: vec!["Lisboa".to_string()],
                    budget_min: Some(200_000),
                    budget_max: Some(350_000),
                    bedrooms_min: Some(2),
                    ..SearchCriteria::default()
                },
            ),
            profile(
                "bp-joao",
                "Joao Silva",
                None,
                SearchCriteria {
                    property_types: types(&["house", "villa"]),
                    locations: vec!["Cascais".to_string(), "Sintra".to_string()],
                    budget_max: Some(900_000),
                    listing_type: ListingPreference::Sale,
                    ..SearchCriteria::default()
                },
            ),
            profile(
                "bp-ines",
                "Ines Moreira",
                Some("rita@agency.test"),
                SearchCriteria {
                    property_types: types(&["apartment"]),
                    locations: vec!["Porto".to_string()],
                    budget_max: Some(1_200),
                    square_feet_min: Some(60),
                    listing_type: ListingPreference::Rent,
                    ..SearchCriteria::default()
                },
            ),
        ],
        properties: vec![
            listing(
                "LX-001",
                "T2 Alvalade",
                "apartment",
                ListingType::Sale,
                320_000,
                "Lisboa",
                "Av. da Igreja 4",
                2,
                Some(85.0),
            ),
            listing(
                "LX-002",
                "T3 Parque das Nacoes",
                "apartment",
                ListingType::Sale,
                345_000,
                "Lisboa",
                "Rua do Pacifico 1",
                3,
                Some(110.0),
            ),
            listing(
                "LX-003",
                "T1 Baixa",
                "apartment",
                ListingType::Sale,
                290_000,
                "Lisboa",
                "Rua Augusta 100",
                1,
                Some(48.0),
            ),
            listing(
                "LX-004",
                "T2 Bonfim",
                "apartment",
                ListingType::Rent,
                1_350,
                "Porto",
                "Rua do Heroismo 20",
                2,
                Some(72.0),
            ),
            listing(
                "CS-001",
                "Moradia Estoril",
                "house",
                ListingType::Sale,
                850_000,
                "Cascais",
                "Av. Marginal 12",
                4,
                Some(240.0),
            ),
            listing(
                "CS-002",
                "Villa Colares",
                "villa",
                ListingType::Sale,
                990_000,
                "Sintra",
                "Estrada de Colares",
                5,
                None,
            ),
        ],
        saved_searches: vec![SavedSearch {
            id: SavedSearchId::new("ss-ana-lisboa"),
            name: "Lisboa T2+".to_string(),
            contact_id: ContactId::new("c-ana"),
            agent_email: Some("rita@agency.test".to_string()),
            created_by: None,
            active: true,
            criteria: SearchCriteria {
                property_types: types(&["apartment"]),
                locations: vec!["Lisboa".to_string()],
                bedrooms_min: Some(2),
                ..SearchCriteria::default()
            },
            sent_property_ids: BTreeSet::from([PropertyId::new("LX-001")]),
            last_alert_at: None,
        }],
        feedback: vec![PropertyFeedback {
            id: FeedbackId::new("fb-ana-lx003"),
            contact_id: ContactId::new("c-ana"),
            property_id: PropertyId::new("LX-003"),
            verdict: FeedbackVerdict::Rejected,
        }],
        notifications: Vec::new(),
    }
}

fn types(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn profile(
    id: &str,
    buyer_name: &str,
    agent: Option<&str>,
    criteria: SearchCriteria,
) -> BuyerProfile {
    let contact = id.trim_start_matches("bp-");
    BuyerProfile {
        id: ProfileId::new(id),
        buyer_name: buyer_name.to_string(),
        contact_id: Some(ContactId::new(format!("c-{contact}"))),
        assigned_agent_email: agent.map(str::to_string),
        created_by: Some("miguel@agency.test".to_string()),
        status: ProfileStatus::Active,
        criteria,
        last_match_date: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn listing(
    id: &str,
    title: &str,
    property_type: &str,
    listing_type: ListingType,
    price: u64,
    city: &str,
    address: &str,
    bedrooms: u32,
    useful_area: Option<f64>,
) -> Property {
    Property {
        id: PropertyId::new(id),
        title: title.to_string(),
        external_ref: Some(id.to_string()),
        property_type: property_type.to_string(),
        listing_type,
        price,
        city: city.to_string(),
        address: address.to_string(),
        bedrooms,
        useful_area,
        gross_area: None,
        square_feet: None,
        status: PropertyStatus::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            now: Some(
                parse_timestamp("2025-10-06T09:00:00Z").expect("valid timestamp"),
            ),
            skip_alerts: false,
            show_breakdown: true,
        };

        run_demo(args).expect("demo completes");
    }

    #[test]
    fn demo_feed_skips_relisted_and_invalid_rows() {
        let store = Arc::new(InMemoryStore::from_dataset(demo_dataset()));
        let service = MatchingService::new(store, MatchingConfig::default());

        let report = service
            .sync_feed(FeedFormat::Csv, DEMO_FEED.as_bytes())
            .expect("feed syncs");

        assert_eq!(report.received, 4);
        assert_eq!(report.created, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.invalid.len(), 1);
    }
}
