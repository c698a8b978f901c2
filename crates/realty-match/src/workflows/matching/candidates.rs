use std::collections::BTreeSet;

use super::domain::{
    ContactId, FeedbackVerdict, Property, PropertyFeedback, PropertyId, SearchCriteria,
};

/// Listings worth scoring for `criteria`, in the order they were loaded.
///
/// Drops listings whose listing type conflicts with the declared preference and any
/// listing already sent to, or rejected by, the owner of the criteria.
pub fn candidates<'a>(
    criteria: &SearchCriteria,
    properties: &'a [Property],
    sent_ids: &BTreeSet<PropertyId>,
    rejected_ids: &BTreeSet<PropertyId>,
) -> Vec<&'a Property> {
    properties
        .iter()
        .filter(|property| criteria.listing_type.accepts(property.listing_type))
        .filter(|property| !sent_ids.contains(&property.id))
        .filter(|property| !rejected_ids.contains(&property.id))
        .collect()
}

/// Every listing the contact explicitly rejected.
pub fn rejected_for(contact_id: &ContactId, feedback: &[PropertyFeedback]) -> BTreeSet<PropertyId> {
    feedback
        .iter()
        .filter(|entry| &entry.contact_id == contact_id)
        .filter(|entry| entry.verdict == FeedbackVerdict::Rejected)
        .map(|entry| entry.property_id.clone())
        .collect()
}
