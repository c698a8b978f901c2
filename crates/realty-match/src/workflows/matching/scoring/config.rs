use serde::{Deserialize, Serialize};

use super::MatchCriterion;

pub const DEFAULT_MATCH_THRESHOLD: u8 = 70;
pub const DEFAULT_TOP_LIMIT: usize = 3;
/// Upper bound on the sum of all criterion weights.
pub const MAX_TOTAL_WEIGHT: u64 = 10_000;

/// Weight awarded per satisfied criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub property_type: u32,
    pub budget: u32,
    pub location: u32,
    pub bedrooms: u32,
    pub area: u32,
    pub listing_type: u32,
}

impl ScoringWeights {
    pub fn weight(&self, criterion: MatchCriterion) -> u32 {
        match criterion {
            MatchCriterion::PropertyType => self.property_type,
            MatchCriterion::Budget => self.budget,
            MatchCriterion::Location => self.location,
            MatchCriterion::Bedrooms => self.bedrooms,
            MatchCriterion::Area => self.area,
            MatchCriterion::ListingType => self.listing_type,
        }
    }

    pub fn total(&self) -> u64 {
        [
            self.property_type,
            self.budget,
            self.location,
            self.bedrooms,
            self.area,
            self.listing_type,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            property_type: 40,
            budget: 25,
            location: 20,
            bedrooms: 10,
            area: 10,
            listing_type: 5,
        }
    }
}

/// Rubric and notification limits for a matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub weights: ScoringWeights,
    /// Inclusive lower bound for a pair to count as a match.
    pub match_threshold: u8,
    /// Matches quoted in a single notification.
    pub top_limit: usize,
}

impl MatchingConfig {
    pub fn is_match(&self, score: u8) -> bool {
        score >= self.match_threshold
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            top_limit: DEFAULT_TOP_LIMIT,
        }
    }
}
