//! Comparables Commands
//!
//! Finding sold comparables for the subject, selecting them, repair and MAO
//! inputs, and server-side MAO recalculation.

use serde_json::Value;
use tracing::{debug, info};

use compscope_client::{ErrorContext, FindComparablesRequest};
use compscope_core::{AnalysisResult, CompSelection, MaoInputs, MaoInputsUpdate, RepairInputs};

use crate::models::analysis::{ComparablesList, FindComparablesResponse};
use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

const NO_COMPS_MESSAGE: &str = "No comparable properties found. This area may not have recent sales. Try selecting a property in a different area or check if the area has recent sales.";

/// Find sold comparables around the selected subject.
///
/// Any previous comparables and selection are dropped first. When the server
/// assigns the subject a database id, the subject adopts it.
pub async fn find_comparables(state: &AppState) -> CommandResponse<ComparablesList> {
    let Some(subject) = state.comps().selected_property() else {
        return CommandResponse::err("No property selected");
    };

    let result: AppResult<ComparablesList> = async {
        let filters = state.comps().search_filters();
        let payload = subject.comparable_search_payload(Some(&filters))?;
        state.comps().begin_find()?;

        let property_id = subject
            .api_id()
            .ok_or_else(|| AppError::validation("Property ID is required"))?;
        debug!(property_id = %property_id, "Finding comparables");
        let body = state
            .api_client()
            .await?
            .find_comparables(&property_id, &FindComparablesRequest::new(payload))
            .await?;

        let parsed = FindComparablesResponse::from_value(&body);
        if let Some(server_id) = parsed.property_id.as_deref() {
            if server_id != property_id {
                state.comps().assign_property_id(server_id)?;
            }
        }
        state.comps().set_comparables(parsed.comparables.clone())?;
        Ok(parsed.comparables)
    }
    .await;

    match &result {
        Ok(list) if list.error.is_some() => {
            state
                .notifier()
                .error(list.error.clone().unwrap_or_default());
        }
        Ok(list) if list.is_empty() => state.notifier().info(NO_COMPS_MESSAGE),
        Ok(list) => {
            info!(count = list.count, "Comparables found");
            state
                .notifier()
                .success(format!("Found {} sold comparable properties", list.count));
        }
        Err(e) if e.is_validation() => {}
        Err(e) => {
            let message = e.user_message(ErrorContext::FindComparables);
            // Keep the failure visible in the stored list
            let _ = state.comps().set_comparables(ComparablesList {
                error: Some(message),
                ..ComparablesList::default()
            });
        }
    }
    CommandResponse::from_result(result, ErrorContext::FindComparables)
}

/// Current comparables list
pub fn list_comparables(state: &AppState) -> CommandResponse<ComparablesList> {
    CommandResponse::ok(state.comps().comparables())
}

/// Select or deselect one comparable by id
pub fn toggle_comp(state: &AppState, comp_id: &str, selected: bool) -> CommandResponse<CompSelection> {
    let result = state.comps().toggle_comp(comp_id.trim(), selected);
    if let Err(e) = &result {
        if e.is_validation() {
            state.notifier().warning(e.to_string());
        }
    }
    result.into()
}

/// Store the repair checklist; returns the derived repair total
pub fn set_repair_inputs(state: &AppState, inputs: RepairInputs) -> CommandResponse<u64> {
    state.comps().set_repair_inputs(inputs).into()
}

/// Merge user edits into the MAO inputs
pub fn update_mao_inputs(state: &AppState, update: MaoInputsUpdate) -> CommandResponse<MaoInputs> {
    state.comps().update_mao_inputs(&update).into()
}

/// Re-run MAO for the stored analysis with the current inputs
pub async fn recalculate_mao(state: &AppState) -> CommandResponse<AnalysisResult> {
    let Some(mut current) = state.comps().analysis().data else {
        return CommandResponse::err("Run an analysis before recalculating MAO");
    };
    let Some(analysis_id) = current.id().map(str::to_string) else {
        return CommandResponse::err("Analysis ID not found");
    };

    let result: AppResult<AnalysisResult> = async {
        let inputs = state.comps().mao_inputs();
        let body = state
            .api_client()
            .await?
            .recalculate_mao(&analysis_id, &inputs)
            .await?;
        let update = analysis_from_envelope(&body)
            .ok_or_else(|| AppError::internal("Recalculation returned no analysis"))?;
        current.apply_recalculation(&update);
        state.comps().set_analysis_result(current.clone())?;
        Ok(current)
    }
    .await;

    if result.is_ok() {
        state.notifier().success("MAO recalculated successfully!");
    }
    CommandResponse::from_result(result, ErrorContext::Recalculate)
}

/// Fetch the stored analysis for the subject from the server
pub async fn get_analysis(state: &AppState) -> CommandResponse<AnalysisResult> {
    let result: AppResult<AnalysisResult> = async {
        let property_id = subject_id(state)?;
        let body = state.api_client().await?.get_analysis(&property_id).await?;
        let analysis = analysis_from_envelope(&body)
            .ok_or_else(|| AppError::not_found("No analysis stored for this property"))?;
        state.comps().set_analysis_result(analysis.clone())?;
        Ok(analysis)
    }
    .await;
    CommandResponse::from_result(result, ErrorContext::Analysis)
}

/// Per-image condition analyses for the subject
pub async fn get_image_analyses(state: &AppState) -> CommandResponse<Value> {
    let result: AppResult<Value> = async {
        let property_id = subject_id(state)?;
        let body = state
            .api_client()
            .await?
            .get_image_analyses(&property_id)
            .await?;
        Ok(body.get("data").cloned().unwrap_or(body))
    }
    .await;
    CommandResponse::from_result(result, ErrorContext::Analysis)
}

fn subject_id(state: &AppState) -> AppResult<String> {
    state
        .comps()
        .selected_property()
        .and_then(|p| p.any_id())
        .ok_or_else(|| AppError::validation("Property ID is required"))
}

/// Accepts `{data: {...}}` or a bare result object
fn analysis_from_envelope(body: &Value) -> Option<AnalysisResult> {
    let inner = body
        .get("data")
        .filter(|v| v.is_object())
        .unwrap_or(body);
    inner
        .is_object()
        .then(|| AnalysisResult::new(inner.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::Property;
    use crate::models::settings::AppConfig;
    use serde_json::json;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::default()).unwrap()
    }

    #[test]
    fn test_analysis_from_envelope() {
        let wrapped = analysis_from_envelope(&json!({
            "success": true,
            "data": {"analysis": {"_id": "a1"}, "mao": {"mao": 150000}}
        }))
        .unwrap();
        assert_eq!(wrapped.id(), Some("a1"));
        assert_eq!(wrapped.mao(), Some(150000.0));

        let bare = analysis_from_envelope(&json!({"analysis": {"arv": 300000}}));
        assert_eq!(bare.and_then(|a| a.arv()), Some(300000.0));

        assert!(analysis_from_envelope(&json!([1, 2])).is_none());
    }

    #[tokio::test]
    async fn test_find_requires_selection() {
        let response = find_comparables(&state()).await;
        assert_eq!(response.error.as_deref(), Some("No property selected"));
    }

    #[tokio::test]
    async fn test_find_rejects_subject_without_address() {
        let state = state();
        state
            .comps()
            .select_property(Property::from_value(json!({"_id": "p1"})).unwrap(), vec![])
            .unwrap();
        let response = find_comparables(&state).await;
        assert_eq!(
            response.error.as_deref(),
            Some("Property address is required. Cannot find comparables without address.")
        );
    }

    #[tokio::test]
    async fn test_recalculate_requires_analysis() {
        let response = recalculate_mao(&state()).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_recalculate_requires_analysis_id() {
        let state = state();
        state
            .comps()
            .set_analysis_result(AnalysisResult::new(json!({"mao": {"mao": 1}})))
            .unwrap();
        let response = recalculate_mao(&state).await;
        assert_eq!(response.error.as_deref(), Some("Analysis ID not found"));
    }

    #[test]
    fn test_set_repair_inputs_returns_total() {
        let state = state();
        let response = set_repair_inputs(
            &state,
            RepairInputs {
                needs_ac: true,
                ..RepairInputs::default()
            },
        );
        assert!(response.success);
        assert!(response.data.unwrap() > 0);
    }
}
