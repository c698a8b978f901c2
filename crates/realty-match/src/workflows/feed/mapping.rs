use super::parser::RawListing;
use crate::workflows::matching::domain::{
    ListingType, Property, PropertyId, PropertyStatus,
};

/// Validated feed row, ready to be stored once it has an id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeedListing {
    pub(crate) external_ref: Option<String>,
    pub(crate) title: String,
    pub(crate) property_type: String,
    pub(crate) listing_type: ListingType,
    pub(crate) price: u64,
    pub(crate) city: String,
    pub(crate) address: String,
    pub(crate) bedrooms: u32,
    pub(crate) useful_area: Option<f64>,
    pub(crate) gross_area: Option<f64>,
    pub(crate) square_feet: Option<f64>,
}

impl FeedListing {
    pub(crate) fn into_property(self, id: PropertyId) -> Property {
        Property {
            id,
            title: self.title,
            external_ref: self.external_ref,
            property_type: self.property_type,
            listing_type: self.listing_type,
            price: self.price,
            city: self.city,
            address: self.address,
            bedrooms: self.bedrooms,
            useful_area: self.useful_area,
            gross_area: self.gross_area,
            square_feet: self.square_feet,
            status: PropertyStatus::Active,
        }
    }
}

pub(crate) fn map_listing(raw: RawListing) -> Result<FeedListing, String> {
    let title = raw.title.ok_or("missing title")?;
    let property_type = raw
        .property_type
        .map(|value| value.trim().to_lowercase())
        .ok_or("missing property type")?;
    let listing_type = match raw.listing_type {
        Some(value) => {
            ListingType::parse(&value).ok_or_else(|| format!("unknown listing type '{value}'"))?
        }
        None => return Err("missing listing type".to_string()),
    };
    let price = raw.price.ok_or("missing price")?;
    let price = parse_amount(&price, "price")?.round() as u64;

    let bedrooms = match raw.bedrooms {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("bedrooms must be a whole number, found '{value}'"))?,
        None => 0,
    };

    Ok(FeedListing {
        external_ref: raw.external_ref.map(|value| value.trim().to_string()),
        title: title.trim().to_string(),
        property_type,
        listing_type,
        price,
        city: raw.city.unwrap_or_default().trim().to_string(),
        address: raw.address.unwrap_or_default().trim().to_string(),
        bedrooms,
        useful_area: optional_amount(raw.useful_area, "useful_area")?,
        gross_area: optional_amount(raw.gross_area, "gross_area")?,
        square_feet: optional_amount(raw.square_feet, "square_feet")?,
    })
}

fn parse_amount(value: &str, field: &str) -> Result<f64, String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€' && *c != '$')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(format!("{field} must be a non-negative number, found '{value}'")),
    }
}

fn optional_amount(value: Option<String>, field: &str) -> Result<Option<f64>, String> {
    value.map(|value| parse_amount(&value, field)).transpose()
}
