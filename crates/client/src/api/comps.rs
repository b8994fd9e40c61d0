//! Comparable and analysis endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use compscope_core::{MaoInputs, StepEvent};

use super::ApiClient;
use crate::error::ClientResult;
use crate::resolver::{consume_event_stream, StreamOutcome};
use crate::transport::open_event_stream;

pub const DEFAULT_TIME_WINDOW_MONTHS: u32 = 12;
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// Body of `POST /comps/find/{propertyId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindComparablesRequest {
    pub time_window_months: u32,
    pub max_results: u32,
    /// Location payload of the subject property.
    pub property_data: Value,
}

impl FindComparablesRequest {
    pub fn new(property_data: Value) -> Self {
        Self {
            time_window_months: DEFAULT_TIME_WINDOW_MONTHS,
            max_results: DEFAULT_MAX_RESULTS,
            property_data,
        }
    }
}

/// Body of `POST /comps/analyze-selected-stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSelectedRequest {
    pub property_id: String,
    pub selected_comp_ids: Vec<String>,
    pub mao_inputs: MaoInputs,
    /// Always sent, empty when the subject has no photos.
    #[serde(default)]
    pub subject_images: Vec<String>,
}

impl ApiClient {
    pub async fn find_comparables(
        &self,
        property_id: &str,
        request: &FindComparablesRequest,
    ) -> ClientResult<Value> {
        self.post_json(&format!("/comps/find/{}", property_id), request)
            .await
    }

    pub async fn get_analysis(&self, property_id: &str) -> ClientResult<Value> {
        self.get_json(&format!("/comps/analysis/{}", property_id))
            .await
    }

    pub async fn get_comparables(
        &self,
        property_id: &str,
        limit: u32,
        min_score: f64,
    ) -> ClientResult<Value> {
        self.get_json(&format!(
            "/comps/{}?limit={}&minScore={}",
            property_id, limit, min_score
        ))
        .await
    }

    pub async fn get_image_analyses(&self, property_id: &str) -> ClientResult<Value> {
        self.get_json(&format!("/comps/images/{}", property_id))
            .await
    }

    /// Re-run the MAO calculation of a stored analysis with new inputs.
    pub async fn recalculate_mao(&self, analysis_id: &str, inputs: &MaoInputs) -> ClientResult<Value> {
        self.post_json(&format!("/comps/recalculate/{}", analysis_id), inputs)
            .await
    }

    /// Streaming analysis: reports each step through `on_step` and resolves
    /// with the final analysis.
    pub async fn analyze_selected_stream<F>(
        &self,
        request: &AnalyzeSelectedRequest,
        cancel: &CancellationToken,
        on_step: F,
    ) -> ClientResult<StreamOutcome>
    where
        F: FnMut(&StepEvent),
    {
        let url = self.endpoint("/comps/analyze-selected-stream");
        let open = open_event_stream(self.http(), &url, self.token(), request);
        let mut source = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
            source = open => source?,
        };
        consume_event_stream(&mut source, cancel, on_step).await
    }
}
