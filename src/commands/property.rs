//! Property Commands
//!
//! Property search, address lookup, subject selection and detail fetch.

use serde_json::Value;
use tracing::{debug, warn};

use compscope_client::{ErrorContext, FetchDetailsRequest};

use crate::models::analysis::SearchResults;
use crate::models::property::Property;
use crate::models::response::CommandResponse;
use crate::models::search::{validate_search_form, SearchFilters};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Pull property records out of a search response.
///
/// Accepts a bare array or an object carrying `properties`, `data` or
/// `results`, or a single `property`.
pub fn properties_from_response(body: &Value) -> Vec<Property> {
    let list = if body.is_array() {
        Some(body)
    } else {
        ["properties", "data", "results"]
            .iter()
            .filter_map(|k| body.get(*k))
            .find(|v| v.is_array())
    };
    match list {
        Some(Value::Array(items)) => items.iter().cloned().filter_map(Property::from_value).collect(),
        _ => body
            .get("property")
            .cloned()
            .and_then(Property::from_value)
            .into_iter()
            .collect(),
    }
}

fn server_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// Search properties with the form filters. Validation errors are reported
/// per field and nothing is sent.
pub async fn search_properties(state: &AppState, filters: SearchFilters) -> CommandResponse<SearchResults> {
    let errors = validate_search_form(&filters);
    if !errors.is_empty() {
        let message = errors.values().cloned().collect::<Vec<_>>().join("; ");
        return CommandResponse::err(message);
    }

    let result: AppResult<SearchResults> = async {
        let body = state.api_client().await?.search_properties(&filters).await?;
        let results = SearchResults::found(properties_from_response(&body));
        state
            .comps()
            .set_search_results(results.clone(), Some(filters.clone()))?;
        Ok(results)
    }
    .await;

    match &result {
        Ok(results) if results.count > 0 => state
            .notifier()
            .success(format!("Found {} properties", results.count)),
        Ok(_) => state.notifier().info("No properties found for these filters"),
        Err(e) => record_search_failure(state, e),
    }
    CommandResponse::from_result(result, ErrorContext::PropertySearch)
}

fn record_search_failure(state: &AppState, error: &AppError) {
    let recorded = match error {
        AppError::Client(e) => e.server_message().unwrap_or("Search failed").to_string(),
        _ => "Search failed".to_string(),
    };
    if let Err(e) = state
        .comps()
        .set_search_results(SearchResults::failed(recorded), None)
    {
        warn!(error = %e, "Could not record search failure");
    }
}

/// Look up a single property by its full address
pub async fn lookup_address(state: &AppState, address: &str) -> CommandResponse<SearchResults> {
    let address = address.trim();
    if address.is_empty() {
        return CommandResponse::err("Please enter a property address");
    }

    let result: AppResult<SearchResults> = async {
        let body = state
            .api_client()
            .await?
            .search_property_by_address(address)
            .await?;
        let property = body
            .get("property")
            .cloned()
            .and_then(Property::from_value)
            .filter(|_| server_success(&body));
        let results = match property {
            Some(property) => SearchResults::found(vec![property]),
            None => SearchResults::found(Vec::new()),
        };
        state.comps().set_search_results(results.clone(), None)?;
        Ok(results)
    }
    .await;

    match &result {
        Ok(results) if results.count > 0 => state.notifier().success("Property found successfully"),
        Ok(_) => state.notifier().error("Property not found for the given address"),
        Err(e) => record_search_failure(state, e),
    }
    CommandResponse::from_result(result, ErrorContext::AddressLookup)
}

/// Find a search result by id, or by 1-based position
fn pick_result(results: &SearchResults, selector: &str) -> Option<Property> {
    let selector = selector.trim();
    if let Some(found) = results
        .properties
        .iter()
        .find(|p| p.any_id().as_deref() == Some(selector))
    {
        return Some(found.clone());
    }
    selector
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| results.properties.get(i))
        .cloned()
}

/// Make a search result the subject property
pub async fn select_property(
    state: &AppState,
    selector: &str,
    uploaded_images: Vec<String>,
) -> CommandResponse<Property> {
    let results = state.comps().search_results();
    let result = match pick_result(&results, selector) {
        Some(property) => state.comps().select_property(property, uploaded_images),
        None => Err(AppError::not_found(format!(
            "No search result matches {}",
            selector.trim()
        ))),
    };
    result.into()
}

/// Fetch full details (photos, areas) for the subject and merge them in.
///
/// A failed fetch leaves the subject as it was; the existing data is still
/// usable for finding comparables.
pub async fn fetch_property_details(state: &AppState) -> CommandResponse<Property> {
    let Some(selected) = state.comps().selected_property() else {
        return CommandResponse::err("No property selected");
    };

    let has_uploads = selected.has_uploaded_images();
    if !has_uploads && selected.has_full_details() {
        debug!("Subject already has full details, skipping fetch");
        return CommandResponse::ok(selected);
    }

    let request = FetchDetailsRequest {
        property_id: selected.any_id(),
        property_url: selected.property_url(),
        zpid: selected.source_zpid(),
    };
    if request.property_id.is_none() && request.property_url.is_none() && request.zpid.is_none() {
        return CommandResponse::err(
            "Cannot fetch property details: missing propertyId, propertyUrl, or zpid",
        );
    }

    let body = match state.api_client().await {
        Ok(client) => client.fetch_property_details(&request).await.map_err(AppError::from),
        Err(e) => Err(e),
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Property detail fetch failed, keeping existing data");
            return CommandResponse::ok(selected);
        }
    };

    let Some(fetched) = body
        .get("property")
        .cloned()
        .and_then(Property::from_value)
        .filter(|_| server_success(&body))
    else {
        return CommandResponse::ok(selected);
    };

    let uploads = selected
        .get("uploadedImages")
        .cloned()
        .filter(|_| has_uploads);
    let mut merged = selected;
    merged.merge(&fetched);
    let images = uploads
        .clone()
        .or_else(|| body.get("images").cloned())
        .or_else(|| fetched.get("images").cloned())
        .unwrap_or_else(|| Value::Array(Vec::new()));
    merged.set("images", images);
    if let Some(uploads) = uploads {
        merged.set("uploadedImages", uploads);
    }

    let message = if has_uploads {
        format!(
            "Property details loaded. Showing your {} uploaded photo(s).",
            merged.subject_images().len()
        )
    } else {
        body.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                let count = body
                    .get("imageCount")
                    .and_then(Value::as_u64)
                    .or_else(|| body.get("images").and_then(Value::as_array).map(|a| a.len() as u64))
                    .unwrap_or(0);
                format!("Fetched property details with {} images", count)
            })
    };

    let result = state.comps().update_selected_property(merged);
    if result.is_ok() {
        state.notifier().success(message);
    }
    result.into()
}
