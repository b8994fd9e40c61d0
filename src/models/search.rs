//! Search Models
//!
//! Property search filters as entered on the search form, plus the form
//! validation that runs before any search request is sent.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field key used for the min/max price error
pub const PRICE_RANGE_KEY: &str = "priceRange";

/// Filters for `POST /property/searchproperties`.
///
/// Values are kept as typed by the user; the server does its own coercion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baths: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

/// Per-field validation errors keyed by the form's field names
/// (`city`, `state`, `postalCode`, `beds`, `baths`, `sqft`, `priceRange`).
pub type FieldErrors = BTreeMap<&'static str, String>;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn leading_int(value: &str) -> Option<i64> {
    static INT: OnceLock<Option<Regex>> = OnceLock::new();
    let re = INT.get_or_init(|| Regex::new(r"^\s*[+-]?\d+").ok()).as_ref()?;
    re.find(value)?.as_str().trim().parse().ok()
}

fn leading_float(value: &str) -> Option<f64> {
    static FLOAT: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FLOAT
        .get_or_init(|| Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)").ok())
        .as_ref()?;
    re.find(value)?.as_str().trim().parse().ok()
}

pub fn validate_postal_code(postal_code: &Option<String>) -> Option<String> {
    let Some(code) = present(postal_code) else {
        return Some("Postal code is required".to_string());
    };
    let valid = code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit());
    (!valid).then(|| "Postal code must be 5 digits".to_string())
}

pub fn validate_beds(beds: &Option<String>) -> Option<String> {
    let Some(raw) = present(beds) else {
        return Some("Beds is required".to_string());
    };
    match leading_int(raw) {
        Some(n) if (1..=10).contains(&n) => None,
        _ => Some("Beds must be between 1 and 10".to_string()),
    }
}

pub fn validate_baths(baths: &Option<String>) -> Option<String> {
    let Some(raw) = present(baths) else {
        return Some("Baths is required".to_string());
    };
    match leading_float(raw) {
        Some(n) if (1.0..=10.0).contains(&n) => None,
        _ => Some("Baths must be between 1 and 10".to_string()),
    }
}

pub fn validate_sqft(sqft: &Option<String>) -> Option<String> {
    let Some(raw) = present(sqft) else {
        return Some("Square footage is required".to_string());
    };
    match leading_int(raw) {
        Some(n) if (100..=10_000).contains(&n) => None,
        _ => Some("Square footage must be between 100 and 10,000".to_string()),
    }
}

/// Only checked when both bounds are given and both parse.
pub fn validate_price_range(min_price: &Option<String>, max_price: &Option<String>) -> Option<String> {
    let (min, max) = (present(min_price)?, present(max_price)?);
    let (min, max) = (leading_float(min)?, leading_float(max)?);
    (max <= min).then(|| "Max price must be greater than min price".to_string())
}

/// Validate the search form. An empty map means the form may be submitted.
pub fn validate_search_form(filters: &SearchFilters) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if filters.city.as_deref().map_or(true, |c| c.trim().is_empty()) {
        errors.insert("city", "City is required".to_string());
    }
    if filters.state.as_deref().map_or(true, |s| s.trim().is_empty()) {
        errors.insert("state", "State is required".to_string());
    }

    let checks = [
        ("postalCode", validate_postal_code(&filters.postal_code)),
        ("beds", validate_beds(&filters.beds)),
        ("baths", validate_baths(&filters.baths)),
        ("sqft", validate_sqft(&filters.sqft)),
        (
            PRICE_RANGE_KEY,
            validate_price_range(&filters.min_price, &filters.max_price),
        ),
    ];
    for (field, error) in checks {
        if let Some(message) = error {
            errors.insert(field, message);
        }
    }

    errors
}
