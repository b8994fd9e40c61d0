//! Analysis Models
//!
//! Search results, found comparables and the stored analysis, plus parsers for
//! the loosely shaped server envelopes that carry them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use compscope_core::AnalysisResult;

use crate::models::property::Property;

/// Last property search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub properties: Vec<Property>,
    pub count: usize,
    pub no_results: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResults {
    pub fn found(properties: Vec<Property>) -> Self {
        let count = properties.len();
        Self {
            no_results: count == 0,
            properties,
            count,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            no_results: true,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Sold comparables found for the selected property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparablesList {
    pub data: Vec<Property>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparablesList {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Property> {
        self.data.iter().find(|c| c.any_id().as_deref() == Some(id))
    }
}

/// Parsed body of `POST /comps/find/{id}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindComparablesResponse {
    pub success: bool,
    /// Database id of the subject, when the server created or resolved one
    pub property_id: Option<String>,
    pub comparables: ComparablesList,
}

impl FindComparablesResponse {
    pub fn from_value(body: &Value) -> Self {
        let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        let property_id = body
            .get("propertyId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if !success {
            let error = ["error", "message"]
                .iter()
                .filter_map(|k| body.get(*k).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .unwrap_or("Failed to find comparables");
            return Self {
                success,
                property_id,
                comparables: ComparablesList {
                    error: Some(error.to_string()),
                    ..ComparablesList::default()
                },
            };
        }

        let data: Vec<Property> = body
            .get("data")
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().filter_map(Property::from_value).collect())
            .unwrap_or_default();
        let count = body
            .get("count")
            .and_then(Value::as_u64)
            .filter(|c| *c > 0)
            .map(|c| c as usize)
            .unwrap_or(data.len());
        let comparables = if count > 0 && !data.is_empty() {
            ComparablesList {
                data,
                count,
                error: None,
            }
        } else {
            ComparablesList::default()
        };

        Self {
            success,
            property_id,
            comparables,
        }
    }
}

/// Stored result of the last analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How an analysis run finished, when it did not fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed { result: AnalysisResult },
    /// The stream closed without a result
    NoResult,
    Cancelled,
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Completed { result } => Some(result),
            _ => None,
        }
    }
}

/// Warning shown when fewer than the recommended comparables are selected
pub fn few_comps_warning(count: usize) -> String {
    format!(
        "Only {} comparable{} selected. Analysis requires at least 3 comparables for accurate results.",
        count,
        if count == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_response_with_results() {
        let body = json!({
            "success": true,
            "propertyId": "db-1",
            "count": 2,
            "data": [{"_id": "c1"}, {"_id": "c2"}, "junk"]
        });
        let parsed = FindComparablesResponse::from_value(&body);
        assert!(parsed.success);
        assert_eq!(parsed.property_id.as_deref(), Some("db-1"));
        assert_eq!(parsed.comparables.count, 2);
        assert_eq!(parsed.comparables.data.len(), 2);
        assert!(parsed.comparables.find("c2").is_some());
    }

    #[test]
    fn test_find_response_no_results_is_not_an_error() {
        let parsed = FindComparablesResponse::from_value(&json!({"success": true, "data": []}));
        assert!(parsed.success);
        assert!(parsed.comparables.is_empty());
        assert!(parsed.comparables.error.is_none());
    }

    #[test]
    fn test_find_response_failure() {
        let parsed = FindComparablesResponse::from_value(&json!({"success": false, "message": "scraper down"}));
        assert!(!parsed.success);
        assert_eq!(parsed.comparables.error.as_deref(), Some("scraper down"));

        let parsed = FindComparablesResponse::from_value(&json!({}));
        assert_eq!(
            parsed.comparables.error.as_deref(),
            Some("Failed to find comparables")
        );
    }

    #[test]
    fn test_few_comps_warning() {
        assert_eq!(
            few_comps_warning(1),
            "Only 1 comparable selected. Analysis requires at least 3 comparables for accurate results."
        );
        assert!(few_comps_warning(2).starts_with("Only 2 comparables selected."));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(AnalysisOutcome::Cancelled).unwrap();
        assert_eq!(value, json!({"status": "cancelled"}));
    }
}
