use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Blank ids are left for the store to assign.
            pub fn is_unassigned(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Identifier wrapper for buyer/tenant search profiles.
    ProfileId
);
identifier!(
    /// Identifier wrapper for listings.
    PropertyId
);
identifier!(NotificationId);
identifier!(SavedSearchId);
identifier!(
    /// CRM contact owning profiles, saved searches, and feedback.
    ContactId
);
identifier!(FeedbackId);

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub const fn label(self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" | "sell" | "venda" => Some(Self::Sale),
            "rent" | "rental" | "arrendamento" => Some(Self::Rent),
            _ => None,
        }
    }
}

/// Listing type wanted by a profile; `Both` leaves the criterion undeclared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingPreference {
    Sale,
    Rent,
    #[default]
    Both,
}

impl ListingPreference {
    pub fn accepts(self, listing_type: ListingType) -> bool {
        match self {
            ListingPreference::Both => true,
            ListingPreference::Sale => listing_type == ListingType::Sale,
            ListingPreference::Rent => listing_type == ListingType::Rent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Active,
    Reserved,
    Sold,
    Rented,
    Inactive,
}

/// Search preferences shared by buyer profiles and saved searches.
///
/// Every field is optional; a criterion only counts toward the score when declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub property_types: BTreeSet<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub budget_min: Option<u64>,
    #[serde(default)]
    pub budget_max: Option<u64>,
    #[serde(default)]
    pub bedrooms_min: Option<u32>,
    #[serde(default)]
    pub square_feet_min: Option<u32>,
    #[serde(default)]
    pub listing_type: ListingPreference,
}

impl SearchCriteria {
    /// Locations with surrounding whitespace removed; blank entries are ignored.
    pub fn declared_locations(&self) -> impl Iterator<Item = &str> {
        self.locations
            .iter()
            .map(|location| location.trim())
            .filter(|location| !location.is_empty())
    }

    pub fn declares_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }
}

/// A prospective buyer or tenant and the criteria they are searching with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub id: ProfileId,
    pub buyer_name: String,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
    #[serde(default)]
    pub assigned_agent_email: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub status: ProfileStatus,
    #[serde(flatten)]
    pub criteria: SearchCriteria,
    #[serde(default)]
    pub last_match_date: Option<DateTime<Utc>>,
}

impl BuyerProfile {
    pub fn is_active(&self) -> bool {
        self.status == ProfileStatus::Active
    }

    /// Assigned agent first, then whoever created the profile.
    pub fn recipient(&self) -> Option<&str> {
        first_address([
            self.assigned_agent_email.as_deref(),
            self.created_by.as_deref(),
        ])
    }

    pub fn matched_on(&self, now: DateTime<Utc>) -> bool {
        self.last_match_date
            .map(|last| last.date_naive() == now.date_naive())
            .unwrap_or(false)
    }
}

/// A unit for sale or rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    #[serde(default)]
    pub external_ref: Option<String>,
    pub property_type: String,
    pub listing_type: ListingType,
    pub price: u64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub useful_area: Option<f64>,
    #[serde(default)]
    pub gross_area: Option<f64>,
    #[serde(default)]
    pub square_feet: Option<f64>,
    #[serde(default)]
    pub status: PropertyStatus,
}

impl Property {
    pub fn is_active(&self) -> bool {
        self.status == PropertyStatus::Active
    }

    /// Useful area, falling back to gross area and then the raw square footage.
    pub fn usable_area(&self) -> Option<f64> {
        self.useful_area.or(self.gross_area).or(self.square_feet)
    }
}

/// Transient outcome of scoring one listing for one profile or saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub property_id: PropertyId,
    pub property_title: String,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PropertyMatch,
    SearchAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedEntity {
    BuyerProfile,
    SavedSearch,
}

/// In-app notification delivered to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub user_email: String,
    pub related_type: RelatedEntity,
    pub related_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Saved filter driving the listing alert variant of the matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: SavedSearchId,
    pub name: String,
    pub contact_id: ContactId,
    #[serde(default)]
    pub agent_email: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub criteria: SearchCriteria,
    #[serde(default)]
    pub sent_property_ids: BTreeSet<PropertyId>,
    #[serde(default)]
    pub last_alert_at: Option<DateTime<Utc>>,
}

impl SavedSearch {
    pub fn recipient(&self) -> Option<&str> {
        first_address([self.agent_email.as_deref(), self.created_by.as_deref()])
    }

    /// Set union with the already sent ids; returns how many ids were new.
    pub fn record_sent<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a PropertyId>,
    {
        ids.into_iter()
            .filter(|id| self.sent_property_ids.insert((*id).clone()))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackVerdict {
    Interested,
    Rejected,
    Visited,
}

/// A contact's reaction to a listing they were shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFeedback {
    pub id: FeedbackId,
    pub contact_id: ContactId,
    pub property_id: PropertyId,
    pub verdict: FeedbackVerdict,
}

fn first_address<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|address| !address.is_empty())
}
