mod config;
mod rules;

pub use config::{
    MatchingConfig, ScoringWeights, DEFAULT_MATCH_THRESHOLD, DEFAULT_TOP_LIMIT, MAX_TOTAL_WEIGHT,
};

use super::domain::{MatchResult, Property, PropertyId, SearchCriteria};
use serde::{Deserialize, Serialize};

/// Criteria that can contribute to a compatibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriterion {
    PropertyType,
    Budget,
    Location,
    Bedrooms,
    Area,
    ListingType,
}

/// Stateless scorer applying the weighted rubric to a (criteria, listing) pair.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    weights: ScoringWeights,
}

impl MatchScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Compatibility score in `0..=100`.
    pub fn score(&self, criteria: &SearchCriteria, property: &Property) -> u8 {
        self.evaluate(criteria, property).score
    }

    pub fn evaluate(&self, criteria: &SearchCriteria, property: &Property) -> ScoreBreakdown {
        let signals = rules::evaluate_criteria(criteria, property, &self.weights);

        let declared_weight = signals
            .components
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.weight));
        let satisfied_weight = signals
            .components
            .iter()
            .filter(|c| c.satisfied)
            .fold(0u32, |total, c| total.saturating_add(c.weight));

        let score = if signals.disqualified {
            0
        } else {
            percentage(satisfied_weight, declared_weight)
        };

        ScoreBreakdown {
            property_id: property.id.clone(),
            score,
            disqualified: signals.disqualified,
            satisfied_weight,
            declared_weight,
            components: signals.components,
        }
    }

    pub fn match_result(&self, criteria: &SearchCriteria, property: &Property) -> MatchResult {
        MatchResult {
            property_id: property.id.clone(),
            property_title: property.title.clone(),
            score: self.score(criteria, property),
        }
    }
}

/// Rounds half up; no declared weight means no evidence of a match.
fn percentage(satisfied: u32, declared: u32) -> u8 {
    if declared == 0 {
        return 0;
    }
    let satisfied = u64::from(satisfied.min(declared));
    let declared = u64::from(declared);
    ((200 * satisfied + declared) / (2 * declared)) as u8
}

/// Single criterion contribution, kept for auditing why a score came out as it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub criterion: MatchCriterion,
    pub weight: u32,
    pub satisfied: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub property_id: PropertyId,
    pub score: u8,
    pub disqualified: bool,
    pub satisfied_weight: u32,
    pub declared_weight: u32,
    pub components: Vec<CriterionOutcome>,
}
