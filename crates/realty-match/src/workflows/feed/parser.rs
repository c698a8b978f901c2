use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::io::Read;

/// One listing as it appeared in a partner feed, every field still raw text.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub(crate) struct RawListing {
    #[serde(
        default,
        alias = "reference",
        alias = "ref",
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) external_ref: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) title: Option<String>,
    #[serde(
        default,
        alias = "type",
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) property_type: Option<String>,
    #[serde(
        default,
        alias = "business",
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) listing_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) useful_area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) gross_area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) square_feet: Option<String>,
}

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawListing>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv_reader.deserialize::<RawListing>().collect()
}

/// Accepts either a bare array of listings or an object wrapping them in `listings`.
pub(crate) fn parse_json(payload: &[u8]) -> Result<Vec<RawListing>, serde_json::Error> {
    let document: Value = serde_json::from_slice(payload)?;
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("listings") {
            Some(Value::Array(entries)) => entries,
            _ => vec![Value::Object(object)],
        },
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected an array of listings, found {}",
                kind_of(&other)
            )))
        }
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(fields) => flatten_object(&fields),
            _ => RawListing::default(),
        })
        .collect())
}

fn flatten_object(fields: &Map<String, Value>) -> RawListing {
    let text = |keys: &[&str]| keys.iter().find_map(|key| fields.get(*key).and_then(as_text));

    RawListing {
        external_ref: text(&["external_ref", "reference", "ref"]),
        title: text(&["title"]),
        property_type: text(&["property_type", "type"]),
        listing_type: text(&["listing_type", "business"]),
        price: text(&["price"]),
        city: text(&["city"]),
        address: text(&["address"]),
        bedrooms: text(&["bedrooms"]),
        useful_area: text(&["useful_area"]),
        gross_area: text(&["gross_area"]),
        square_feet: text(&["square_feet"]),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
