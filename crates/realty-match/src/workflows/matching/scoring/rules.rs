use super::super::domain::{ListingPreference, Property, SearchCriteria};
use super::config::ScoringWeights;
use super::{CriterionOutcome, MatchCriterion};

pub(crate) struct RuleSignals {
    pub components: Vec<CriterionOutcome>,
    pub disqualified: bool,
}

/// Evaluates every declared criterion, stopping at a property type mismatch.
pub(crate) fn evaluate_criteria(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> RuleSignals {
    let mut components = Vec::new();

    if let Some(outcome) = property_type_rule(criteria, property, weights) {
        let mismatch = !outcome.satisfied;
        components.push(outcome);
        if mismatch {
            return RuleSignals {
                components,
                disqualified: true,
            };
        }
    }

    components.extend(
        [
            budget_rule(criteria, property, weights),
            location_rule(criteria, property, weights),
            bedrooms_rule(criteria, property, weights),
            area_rule(criteria, property, weights),
            listing_type_rule(criteria, property, weights),
        ]
        .into_iter()
        .flatten(),
    );

    RuleSignals {
        components,
        disqualified: false,
    }
}

fn outcome(
    criterion: MatchCriterion,
    weights: &ScoringWeights,
    satisfied: bool,
    notes: String,
) -> CriterionOutcome {
    CriterionOutcome {
        criterion,
        weight: weights.weight(criterion),
        satisfied,
        notes,
    }
}

fn property_type_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    if criteria.property_types.is_empty() {
        return None;
    }

    let satisfied = criteria.property_types.contains(&property.property_type);
    let notes = if satisfied {
        format!("type '{}' is wanted", property.property_type)
    } else {
        format!(
            "type '{}' not among wanted types; listing disqualified",
            property.property_type
        )
    };
    Some(outcome(MatchCriterion::PropertyType, weights, satisfied, notes))
}

fn budget_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    if !criteria.declares_budget() {
        return None;
    }

    let above_min = criteria
        .budget_min
        .map(|min| property.price >= min)
        .unwrap_or(true);
    let below_max = criteria
        .budget_max
        .map(|max| property.price <= max)
        .unwrap_or(true);

    let notes = match (above_min, below_max) {
        (true, true) => format!("price {} within budget", property.price),
        (false, _) => format!(
            "price {} below budget minimum {}",
            property.price,
            criteria.budget_min.unwrap_or_default()
        ),
        (_, false) => format!(
            "price {} above budget maximum {}",
            property.price,
            criteria.budget_max.unwrap_or_default()
        ),
    };
    Some(outcome(
        MatchCriterion::Budget,
        weights,
        above_min && below_max,
        notes,
    ))
}

fn location_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    let mut declared = criteria.declared_locations().peekable();
    declared.peek()?;

    let city = property.city.to_lowercase();
    let address = property.address.to_lowercase();
    let hit = declared.find(|location| {
        let needle = location.to_lowercase();
        city.contains(&needle) || address.contains(&needle)
    });

    let notes = match hit {
        Some(location) => format!("located in '{location}'"),
        None => format!("'{}' outside wanted locations", property.city),
    };
    Some(outcome(MatchCriterion::Location, weights, hit.is_some(), notes))
}

fn bedrooms_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    let minimum = criteria.bedrooms_min?;
    let satisfied = property.bedrooms >= minimum;
    Some(outcome(
        MatchCriterion::Bedrooms,
        weights,
        satisfied,
        format!("{} bedroom(s), wanted at least {minimum}", property.bedrooms),
    ))
}

fn area_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    let minimum = criteria.square_feet_min?;
    let (satisfied, notes) = match property.usable_area() {
        Some(area) => (
            area >= f64::from(minimum),
            format!("{area:.0} of area, wanted at least {minimum}"),
        ),
        None => (false, "listing has no recorded area".to_string()),
    };
    Some(outcome(MatchCriterion::Area, weights, satisfied, notes))
}

fn listing_type_rule(
    criteria: &SearchCriteria,
    property: &Property,
    weights: &ScoringWeights,
) -> Option<CriterionOutcome> {
    if criteria.listing_type == ListingPreference::Both {
        return None;
    }

    let satisfied = criteria.listing_type.accepts(property.listing_type);
    Some(outcome(
        MatchCriterion::ListingType,
        weights,
        satisfied,
        format!("listed for {}", property.listing_type.label()),
    ))
}
