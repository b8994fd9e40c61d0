//! Property Model
//!
//! Properties come back from several upstream sources with inconsistent field
//! names (`squareFootage` vs `sqft`, `zip` vs `postalCode`, ...). `Property`
//! keeps the raw JSON object and exposes typed accessors that try each known
//! spelling in order.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::search::SearchFilters;
use crate::utils::error::{AppError, AppResult};

/// A property record as returned by the search and lookup endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Property {
    fields: Map<String, Value>,
}

/// City / state / postal code parsed from a free-form address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Resolved location of a subject property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyLocation {
    pub formatted_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PropertyLocation {
    /// Both coordinates present, non-zero and within range
    pub fn has_valid_coordinates(&self) -> bool {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                lat != 0.0
                    && lng != 0.0
                    && (-90.0..=90.0).contains(&lat)
                    && (-180.0..=180.0).contains(&lng)
            }
            _ => false,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn url_like(image: &str) -> bool {
    let trimmed = image.trim();
    !trimmed.is_empty()
        && (trimmed.starts_with("http://")
            || trimmed.starts_with("https://")
            || trimmed.starts_with("data:"))
}

impl Property {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wrap a JSON value; anything but an object yields `None`
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// First truthy value among `keys`
    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.fields.get(*k))
            .find(|v| is_truthy(v))
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.first(keys).and_then(as_text)
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        self.first(keys).and_then(as_number)
    }

    fn nested_number(&self, key: &str, inner: &str) -> Option<f64> {
        self.fields
            .get(key)
            .and_then(|v| v.get(inner))
            .filter(|v| is_truthy(v))
            .and_then(as_number)
    }

    fn coordinate(&self, keys: &[&str], index: usize, inner: &str) -> Option<f64> {
        self.number(keys)
            .or_else(|| {
                self.fields
                    .get("coordinates")
                    .and_then(|c| c.get(index))
                    .filter(|v| is_truthy(v))
                    .and_then(as_number)
            })
            .or_else(|| self.nested_number("location", inner))
    }

    /// Identifier used to key the record locally: `_id`, `zpid`, then `id`
    pub fn any_id(&self) -> Option<String> {
        self.text(&["_id", "zpid", "id"])
    }

    /// Identifier sent to the comps endpoints.
    ///
    /// Prefers the server `_id`. Without any id a stable slug is derived from
    /// the address, which the server accepts for properties it has not stored.
    pub fn api_id(&self) -> Option<String> {
        if let Some(id) = self.any_id() {
            return Some(id);
        }
        let source = self
            .display_address()
            .or_else(|| {
                let city = self.text(&["city"]).unwrap_or_default();
                let state = self.text(&["state"]).unwrap_or_default();
                Some(format!("{}-{}", city, state))
                    .filter(|s| s != "-")
            })?;
        let slug: String = source
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        Some(format!("property-{}", slug))
    }

    /// Listing page of the property on the source site
    pub fn property_url(&self) -> Option<String> {
        self.text(&[
            "propertyUrl",
            "property_url",
            "url",
            "zillowUrl",
            "zillow_url",
            "listingUrl",
            "listing_url",
            "sourceUrl",
            "source_url",
        ])
    }

    /// Source-site id (`zpid`, else `sourceId`)
    pub fn source_zpid(&self) -> Option<String> {
        self.text(&["zpid", "sourceId"])
    }

    pub fn has_uploaded_images(&self) -> bool {
        self.fields
            .get("uploadedImages")
            .and_then(Value::as_array)
            .is_some_and(|a| !a.is_empty())
    }

    /// Listing photos plus living and lot area are already present, so a
    /// detail fetch would add nothing
    pub fn has_full_details(&self) -> bool {
        let has_images = self
            .fields
            .get("images")
            .and_then(Value::as_array)
            .is_some_and(|a| !a.is_empty());
        has_images && self.first(&["squareFootage"]).is_some() && self.first(&["lotSize"]).is_some()
    }

    pub fn display_address(&self) -> Option<String> {
        self.text(&["formattedAddress", "formatted_address", "address"])
    }

    /// Subject living area; an explicit `0` counts as present
    pub fn subject_sqft(&self) -> Option<f64> {
        ["squareFootage", "square_footage", "sqft"]
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find(|v| !v.is_null())
            .and_then(as_number)
    }

    /// Listing price
    pub fn price(&self) -> Option<f64> {
        self.number(&["price", "listPrice", "listingPrice", "askingPrice"])
    }

    pub fn sale_price(&self) -> Option<f64> {
        self.number(&["salePrice", "lastSoldPrice", "soldPrice"])
    }

    pub fn beds(&self) -> Option<f64> {
        self.number(&["beds", "bedrooms"])
    }

    pub fn baths(&self) -> Option<f64> {
        self.number(&["baths", "bathrooms"])
    }

    /// Distance from the subject, set on comparables
    pub fn distance_miles(&self) -> Option<f64> {
        self.number(&["distanceMiles", "distance"])
    }

    fn string_list(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Listing photos, keeping only URL-shaped entries
    pub fn images(&self) -> Vec<String> {
        self.first(&["images", "imageUrls", "photos", "photoUrls", "image", "photo"])
            .map(Self::string_list)
            .unwrap_or_default()
            .into_iter()
            .filter(|img| url_like(img))
            .map(|img| img.trim().to_string())
            .collect()
    }

    /// Photos of the subject: user uploads when there are any, else listing photos
    pub fn subject_images(&self) -> Vec<String> {
        let uploaded = self
            .fields
            .get("uploadedImages")
            .map(Self::string_list)
            .unwrap_or_default();
        if uploaded.is_empty() {
            self.images()
        } else {
            uploaded
        }
    }

    /// Whether `other` refers to the same record by `_id`, `zpid` or `id`
    pub fn same_record(&self, other: &Property) -> bool {
        ["_id", "zpid", "id"].iter().any(|key| {
            match (self.fields.get(*key), other.fields.get(*key)) {
                (Some(a), Some(b)) => is_truthy(a) && is_truthy(b) && a == b,
                _ => false,
            }
        })
    }

    /// Shallow merge; keys in `update` win
    pub fn merge(&mut self, update: &Property) {
        for (key, value) in &update.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Resolve the subject location, falling back to the search filters and
    /// then to parsing the address text.
    pub fn location(&self, filters: Option<&SearchFilters>) -> AppResult<PropertyLocation> {
        let from_filters = |pick: fn(&SearchFilters) -> &Option<String>| {
            filters
                .and_then(|f| pick(f).clone())
                .filter(|v| !v.is_empty())
        };

        let mut city = self
            .text(&["city", "cityName", "city_name"])
            .or_else(|| from_filters(|f| &f.city));
        let mut state = self
            .text(&["state", "stateCode", "state_code", "stateName"])
            .or_else(|| from_filters(|f| &f.state));
        let mut postal_code = self
            .text(&[
                "postalCode",
                "postal_code",
                "zipCode",
                "zip_code",
                "zip",
                "postal",
            ])
            .or_else(|| from_filters(|f| &f.postal_code));

        let formatted = self.display_address();
        let address = self.text(&["address"]);

        let mut candidates = Vec::new();
        if let Some(f) = &formatted {
            candidates.push(f.clone());
        }
        if let Some(a) = address.as_ref().filter(|a| Some(*a) != formatted.as_ref()) {
            candidates.push(a.clone());
        }
        for text in candidates {
            if city.is_some() && state.is_some() {
                break;
            }
            let parsed = parse_address_components(&text);
            city = city.or(parsed.city);
            state = state.or(parsed.state);
            postal_code = postal_code.or(parsed.postal_code);
        }

        let street = self.text(&["address", "streetAddress", "street_address", "street"]);
        let formatted_address = formatted
            .unwrap_or_else(|| {
                [street.clone(), city.clone(), state.clone(), postal_code.clone()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .trim()
            .to_string();

        if formatted_address.is_empty() {
            return Err(AppError::validation(
                "Property address is required. Cannot find comparables without address.",
            ));
        }
        let (Some(city), Some(state)) = (city, state) else {
            return Err(AppError::validation(
                "Property city and state are required. The property data is missing location information. Please select a property from search results.",
            ));
        };

        let street = street.unwrap_or_else(|| {
            formatted_address
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        });

        Ok(PropertyLocation {
            formatted_address,
            street,
            city,
            state,
            postal_code,
            latitude: self.coordinate(&["latitude", "lat"], 0, "lat"),
            longitude: self.coordinate(&["longitude", "lng", "lon"], 1, "lng"),
        })
    }

    /// Build the `propertyData` body for `POST /comps/find/{id}`.
    pub fn comparable_search_payload(&self, filters: Option<&SearchFilters>) -> AppResult<Value> {
        let location = self.location(filters)?;
        if !location.has_valid_coordinates() {
            tracing::warn!(
                address = %location.formatted_address,
                "No valid coordinates for subject; server will geocode the address"
            );
        }

        let mut data = Map::new();
        data.insert("formattedAddress".into(), json!(location.formatted_address));
        data.insert("address".into(), json!(location.street));
        data.insert("city".into(), json!(location.city));
        data.insert("state".into(), json!(location.state));
        if let Some(lat) = location.latitude {
            data.insert("latitude".into(), json!(lat));
        }
        if let Some(lng) = location.longitude {
            data.insert("longitude".into(), json!(lng));
        }
        if let Some(postal) = &location.postal_code {
            data.insert("postalCode".into(), json!(postal));
        }

        if let Some(zpid) = self.first(&["zpid"]) {
            data.insert("zpid".into(), zpid.clone());
        }
        if let Some(source) = self.first(&["sourceId", "source_id"]) {
            data.insert("sourceId".into(), source.clone());
        } else if let (Some(id), None) = (self.first(&["id"]), self.first(&["zpid"])) {
            data.insert("sourceId".into(), id.clone());
        }

        let numeric = [
            ("beds", &["beds", "bedrooms", "bed"][..]),
            ("baths", &["baths", "bathrooms", "bath"][..]),
            (
                "squareFootage",
                &[
                    "squareFootage",
                    "square_footage",
                    "sqft",
                    "sq_ft",
                    "area",
                    "livingArea",
                ][..],
            ),
            ("lotSize", &["lotSize", "lot_size", "lotSqft", "lot_sqft"][..]),
            (
                "yearBuilt",
                &["yearBuilt", "year_built", "builtYear", "built_year"][..],
            ),
            (
                "price",
                &["price", "listPrice", "listingPrice", "askingPrice"][..],
            ),
        ];
        for (target, keys) in numeric {
            if let Some(n) = self.number(keys) {
                data.insert(target.into(), json!(n));
            }
        }

        let estimated = ["estimatedValue", "zestimate"]
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find(|v| !v.is_null())
            .and_then(as_number);
        if let Some(value) = estimated {
            data.insert("estimatedValue".into(), json!(value));
            data.insert("zestimate".into(), json!(value));
        }

        if let Some(kind) = self.text(&["propertyType", "property_type", "type"]) {
            data.insert("propertyType".into(), json!(kind));
        }

        let images = self.subject_images();
        if !images.is_empty() {
            data.insert("images".into(), json!(images));
        }

        Ok(Value::Object(data))
    }
}

impl From<Map<String, Value>> for Property {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Parse city, state and ZIP out of a single-line US address.
///
/// Handles `"Street, City, ST 12345"`, `"Street, City, ST"` and
/// `"Street, City ST 12345"`, then falls back to finding `ST 12345`
/// anywhere in the text.
pub fn parse_address_components(address: &str) -> AddressParts {
    struct Patterns {
        state_zip: Regex,
        city_state_zip: Regex,
        anywhere: Regex,
    }
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        Some(Patterns {
            state_zip: Regex::new(r"(?i)^([A-Z]{2})\s*(\d{5}(?:-\d{4})?)?$").ok()?,
            city_state_zip: Regex::new(r"(?i)^(.+?)\s+([A-Z]{2})\s*(\d{5}(?:-\d{4})?)?$").ok()?,
            anywhere: Regex::new(r"(?i)\b([A-Z]{2})\s+(\d{5}(?:-\d{4})?)\b").ok()?,
        })
    });
    let Some(patterns) = patterns.as_ref() else {
        return AddressParts::default();
    };

    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();

    if parts.len() >= 3 {
        if let Some(caps) = patterns.state_zip.captures(parts[2]) {
            return AddressParts {
                city: non_empty(parts[1]),
                state: caps.get(1).map(|m| m.as_str().to_uppercase()),
                postal_code: caps.get(2).map(|m| m.as_str().to_string()),
            };
        }
    } else if parts.len() == 2 {
        if let Some(caps) = patterns.city_state_zip.captures(parts[1]) {
            return AddressParts {
                city: caps.get(1).and_then(|m| non_empty(m.as_str())),
                state: caps.get(2).map(|m| m.as_str().to_uppercase()),
                postal_code: caps.get(3).map(|m| m.as_str().to_string()),
            };
        }
    }

    if let Some(caps) = patterns.anywhere.captures(address) {
        return AddressParts {
            city: None,
            state: caps.get(1).map(|m| m.as_str().to_uppercase()),
            postal_code: caps.get(2).map(|m| m.as_str().to_string()),
        };
    }

    AddressParts::default()
}
