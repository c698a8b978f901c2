//! Partner feed ingestion: turns CSV or JSON listing feeds into stored properties,
//! skipping rows that duplicate listings already on file.

mod mapping;
mod normalizer;
mod parser;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::matching::domain::{Property, PropertyId};
use crate::workflows::matching::repository::{EntityRepository, RepositoryError};
use mapping::{map_listing, FeedListing};
use normalizer::{fingerprint, normalize_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Csv,
    Json,
}

#[derive(Debug)]
pub enum FeedImportError {
    Csv(csv::Error),
    Json(serde_json::Error),
    Repository(RepositoryError),
}

impl fmt::Display for FeedImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedImportError::Csv(err) => write!(f, "invalid CSV listing feed: {}", err),
            FeedImportError::Json(err) => write!(f, "invalid JSON listing feed: {}", err),
            FeedImportError::Repository(err) => {
                write!(f, "could not store feed listings: {}", err)
            }
        }
    }
}

impl std::error::Error for FeedImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedImportError::Csv(err) => Some(err),
            FeedImportError::Json(err) => Some(err),
            FeedImportError::Repository(err) => Some(err),
        }
    }
}

impl From<csv::Error> for FeedImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for FeedImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<RepositoryError> for FeedImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

/// Outcome of a feed sync. Invalid rows are reported by 1-based row number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSyncReport {
    pub received: usize,
    pub created: usize,
    pub duplicates: usize,
    pub invalid: Vec<String>,
    pub created_ids: Vec<PropertyId>,
}

/// Parsed feed: rows that validated plus messages for those that did not.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    listings: Vec<FeedListing>,
    invalid: Vec<String>,
}

impl ParsedFeed {
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn invalid(&self) -> &[String] {
        &self.invalid
    }
}

pub struct PropertyFeedImporter;

impl PropertyFeedImporter {
    pub fn parse(format: FeedFormat, payload: &[u8]) -> Result<ParsedFeed, FeedImportError> {
        let rows = match format {
            FeedFormat::Csv => parser::parse_csv(payload)?,
            FeedFormat::Json => parser::parse_json(payload)?,
        };

        let mut parsed = ParsedFeed::default();
        for (index, raw) in rows.into_iter().enumerate() {
            match map_listing(raw) {
                Ok(listing) => parsed.listings.push(listing),
                Err(reason) => parsed.invalid.push(format!("row {}: {reason}", index + 1)),
            }
        }

        Ok(parsed)
    }
}

/// Keys of listings already on file, grown as the feed is stored.
#[derive(Default)]
struct KnownListings {
    refs: HashSet<String>,
    fingerprints: HashSet<String>,
}

impl KnownListings {
    fn from_properties(properties: &[Property]) -> Self {
        let mut known = Self::default();
        for property in properties {
            known.remember(
                property.external_ref.as_deref(),
                &property.address,
                &property.city,
                property.price,
            );
        }
        known
    }

    fn remember(&mut self, external_ref: Option<&str>, address: &str, city: &str, price: u64) {
        if let Some(reference) = external_ref {
            self.refs.insert(normalize_ref(reference));
        }
        if let Some(key) = fingerprint(address, city, price) {
            self.fingerprints.insert(key);
        }
    }

    fn is_duplicate(&self, listing: &FeedListing) -> bool {
        match &listing.external_ref {
            Some(reference) => self.refs.contains(&normalize_ref(reference)),
            None => fingerprint(&listing.address, &listing.city, listing.price)
                .map(|key| self.fingerprints.contains(&key))
                .unwrap_or(false),
        }
    }
}

/// Parse `payload` and create every listing that is not already stored.
pub fn sync_feed<R>(
    repository: &R,
    format: FeedFormat,
    payload: &[u8],
) -> Result<FeedSyncReport, FeedImportError>
where
    R: EntityRepository<Property>,
{
    let parsed = PropertyFeedImporter::parse(format, payload)?;
    let existing = repository.list()?;
    let mut known = KnownListings::from_properties(&existing);

    let mut report = FeedSyncReport {
        received: parsed.listings.len() + parsed.invalid.len(),
        invalid: parsed.invalid,
        ..FeedSyncReport::default()
    };

    for listing in parsed.listings {
        if known.is_duplicate(&listing) {
            report.duplicates += 1;
            continue;
        }

        known.remember(
            listing.external_ref.as_deref(),
            &listing.address,
            &listing.city,
            listing.price,
        );
        let stored = repository.create(listing.into_property(PropertyId::default()))?;
        report.created += 1;
        report.created_ids.push(stored.id);
    }

    Ok(report)
}
