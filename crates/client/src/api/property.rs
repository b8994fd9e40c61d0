//! Property endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ApiClient;
use crate::error::ClientResult;

/// Identifiers accepted by `/property/fetch-details`; any subset may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDetailsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zpid: Option<String>,
}

impl ApiClient {
    /// Search for-sale properties with the given filters.
    pub async fn search_properties<F>(&self, filters: &F) -> ClientResult<Value>
    where
        F: Serialize + ?Sized,
    {
        self.post_json("/property/searchproperties", filters).await
    }

    /// Look up a single property by its street address.
    pub async fn search_property_by_address(&self, address: &str) -> ClientResult<Value> {
        self.post_json("/property/search-by-address", &json!({ "address": address }))
            .await
    }

    /// Fetch full details, including every image, for one property.
    pub async fn fetch_property_details(&self, request: &FetchDetailsRequest) -> ClientResult<Value> {
        self.post_json("/property/fetch-details", request).await
    }
}
