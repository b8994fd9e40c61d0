//! Streamed analysis through the command layer against a local server.

use pretty_assertions::assert_eq;
use serde_json::json;

use compscope::commands;
use compscope::models::analysis::{AnalysisOutcome, ComparablesList};
use compscope::models::property::Property;
use compscope::services::notice::NoticeLevel;
use compscope::AppState;
use compscope_core::{StepId, StepStatus};

use crate::support::{json_response, sse_response, MockApi};

const COMPLETE_FRAME: &str = "data:{\"type\":\"complete\",\"data\":{\
\"property\":{\"_id\":\"subject-1\",\"address\":\"12 Oak St\"},\
\"analysis\":{\"_id\":\"an-1\",\"arv\":315000,\"mao\":190500,\"estimatedRepairs\":30000,\"conditionCategory\":\"light-repairs\"},\
\"comps\":{\"selected\":[]},\
\"dealScore\":{\"overall\":72,\"spreadScore\":80},\
\"mao\":{\"mao\":190500,\"breakdown\":{\"arv\":315000,\"rulePercent\":0.7,\"baseMAO\":220500}},\
\"recommendation\":{\"recommendation\":\"good-deal\",\"recommendationReason\":\"Spread above target\"}}}\n\n";

fn prepare(state: &AppState, comp_ids: &[&str]) {
    prepare_with_subject(
        state,
        json!({
            "_id": "subject-1",
            "address": "12 Oak St",
            "city": "Austin",
            "state": "TX",
            "squareFootage": 1500,
            "images": ["https://img.example/front.jpg"]
        }),
        comp_ids,
    );
}

fn prepare_with_subject(state: &AppState, subject: serde_json::Value, comp_ids: &[&str]) {
    let subject = Property::from_value(subject).unwrap();
    state.comps().select_property(subject, vec![]).unwrap();

    let data: Vec<Property> = comp_ids
        .iter()
        .map(|id| Property::from_value(json!({"_id": id, "address": format!("{} Elm St", id)})).unwrap())
        .collect();
    state
        .comps()
        .set_comparables(ComparablesList {
            count: data.len(),
            data,
            error: None,
        })
        .unwrap();
    for id in comp_ids {
        state.comps().toggle_comp(id, true).unwrap();
    }
}

#[tokio::test]
async fn test_streamed_analysis_completes() {
    let api = MockApi::start(vec![sse_response(&[
        "data:{\"type\":\"step\",\"step\":\"subject_prep\"}\n\n",
        "data:{\"type\":\"step\",\"step\":\"comp\",\"address\":\"c1 Elm St\",\"index\":1,\"total\":3}\n\ndata:{\"type\":\"step\",",
        "\"step\":\"arv_done\",\"arv\":315000}\n\n",
        "data:{\"type\":\"progress_ping\"}\n\n",
        COMPLETE_FRAME,
    ])])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);
    let mut notices = state.notifier().subscribe();

    let mut seen = Vec::new();
    let response = commands::run_analysis(&state, |progress| {
        seen.push(progress.current_step);
    })
    .await;

    assert!(response.success, "{:?}", response.error);
    let outcome = response.data.unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.mao(), Some(190500.0));
    assert_eq!(result.arv(), Some(315000.0));
    assert_eq!(result.deal_score().and_then(|s| s.overall), Some(72.0));
    assert_eq!(
        result.recommendation().and_then(|r| r.recommendation).as_deref(),
        Some("good-deal")
    );
    assert_eq!(result.repair_extent_label(), "Light repairs");
    assert_eq!(
        seen,
        vec![
            Some(StepId::SubjectPrep),
            Some(StepId::Comp),
            Some(StepId::ArvDone)
        ]
    );

    let progress = state.analysis().progress();
    assert!(progress.is_complete);
    assert_eq!(progress.arv, Some(315000.0));
    assert_eq!(progress.comp_being_analyzed.as_deref(), Some("c1 Elm St"));
    assert_eq!(progress.step_status(StepId::DealScore), StepStatus::Done);
    assert!(progress.current_activity().is_none());

    let stored = state.comps().analysis();
    assert_eq!(stored.data.as_ref().and_then(|a| a.id()), Some("an-1"));
    assert!(!state.analysis().is_running());

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Property analysis completed successfully!");

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/comps/analyze-selected-stream");
    assert!(request.head.to_ascii_lowercase().contains("authorization: bearer test-token"));
    assert_eq!(request.body["propertyId"], "subject-1");
    assert_eq!(request.body["selectedCompIds"], json!(["c1", "c2", "c3"]));
    assert_eq!(request.body["maoInputs"]["maoRule"], "70%");
    assert_eq!(request.body["subjectImages"], json!(["https://img.example/front.jpg"]));
}

#[tokio::test]
async fn test_final_frame_without_separator_still_resolves() {
    let api = MockApi::start(vec![sse_response(&[
        "data:{\"type\":\"step\",\"step\":\"mao_done\",\"mao\":180000}\n\n",
        "{\"type\":\"complete\",\"data\":{\"analysis\":{\"_id\":\"an-2\"},\"mao\":{\"mao\":180000}}}",
    ])])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);

    let response = commands::run_analysis(&state, |_| {}).await;
    let outcome = response.data.unwrap();
    assert_eq!(outcome.result().and_then(|r| r.mao()), Some(180000.0));
}

#[tokio::test]
async fn test_complete_with_unexpected_field_types_still_resolves() {
    let api = MockApi::start(vec![sse_response(&[
        "data:{\"type\":\"step\",\"step\":\"deal_score\"}\n\n",
        "data:{\"type\":\"complete\",\"data\":{\"analysis\":{\"_id\":\"an-3\",\"arv\":\"n/a\"},\"dealScore\":null,\"mao\":{\"breakdown\":7}}}\n\n",
    ])])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);

    let response = commands::run_analysis(&state, |_| {}).await;
    let outcome = response.data.unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.id(), Some("an-3"));
    assert!(result.arv().is_none());
    assert!(result.deal_score().is_none());
    assert!(result.mao_breakdown().is_none());
    assert!(state.analysis().progress().is_complete);
}

#[tokio::test]
async fn test_subject_without_photos_sends_empty_image_list() {
    let api = MockApi::start(vec![sse_response(&[COMPLETE_FRAME])]).await;
    let state = api.state();
    prepare_with_subject(
        &state,
        json!({"_id": "subject-1", "address": "12 Oak St", "city": "Austin", "state": "TX"}),
        &["c1", "c2", "c3"],
    );

    let response = commands::run_analysis(&state, |_| {}).await;
    assert!(response.success, "{:?}", response.error);
    let requests = api.requests();
    assert_eq!(requests[0].body["subjectImages"], json!([]));
}

#[tokio::test]
async fn test_recalculate_mao_updates_stored_result() {
    let api = MockApi::start(vec![
        sse_response(&[COMPLETE_FRAME]),
        json_response(
            200,
            json!({
                "success": true,
                "data": {
                    "analysis": {"_id": "an-1", "arv": 315000, "mao": 175000},
                    "mao": {"mao": 175000, "breakdown": {"arv": 315000, "rulePercent": 0.65}}
                }
            }),
        ),
    ])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);
    assert!(commands::run_analysis(&state, |_| {}).await.success);

    let response = commands::recalculate_mao(&state).await;
    assert!(response.success, "{:?}", response.error);
    let updated = response.data.unwrap();
    assert_eq!(updated.mao(), Some(175000.0));
    assert_eq!(updated.mao_breakdown().and_then(|b| b.rule_percent), Some(0.65));
    // Sections the recalculation does not return are kept
    assert_eq!(updated.deal_score().and_then(|s| s.overall), Some(72.0));

    let stored = state.comps().analysis().data.unwrap();
    assert_eq!(stored, updated);

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].path, "/api/comps/recalculate/an-1");
    assert_eq!(requests[1].body["maoRule"], "70%");
}

#[tokio::test]
async fn test_stream_without_result_is_a_soft_failure() {
    let api = MockApi::start(vec![sse_response(&[
        "data:{\"type\":\"step\",\"step\":\"subject_prep\"}\n\n",
        "data:{\"type\":\"step\",\"step\":\"repairs\"}\n\n",
    ])])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2"]);
    let mut notices = state.notifier().subscribe();

    let response = commands::run_analysis(&state, |_| {}).await;
    assert_eq!(response.data, Some(AnalysisOutcome::NoResult));

    // Two comps: warning first, then the missing-result error
    let warning = notices.recv().await.unwrap();
    assert_eq!(warning.level, NoticeLevel::Warning);
    let error = notices.recv().await.unwrap();
    assert_eq!(error.level, NoticeLevel::Error);
    assert_eq!(error.message, "Analysis did not return results.");

    let progress = state.analysis().progress();
    assert!(!progress.is_complete);
    assert_eq!(progress.current_step, Some(StepId::Repairs));
    assert!(state.comps().analysis().data.is_none());
}

#[tokio::test]
async fn test_server_error_is_worded_for_the_user() {
    let api = MockApi::start(vec![json_response(500, json!({}))]).await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);

    let response = commands::run_analysis(&state, |_| {}).await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Failed to analyze property. Please try again.")
    );
    assert_eq!(state.comps().analysis().error.as_deref(), Some("Analysis failed"));
    assert!(!state.analysis().is_running());
}

#[tokio::test]
async fn test_bad_request_uses_server_message() {
    let api = MockApi::start(vec![json_response(
        400,
        json!({"message": "Selected comps belong to another property"}),
    )])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);

    let response = commands::run_analysis(&state, |_| {}).await;
    assert_eq!(
        response.error.as_deref(),
        Some("Selected comps belong to another property")
    );
    assert_eq!(
        state.comps().analysis().error.as_deref(),
        Some("Selected comps belong to another property")
    );
}

#[tokio::test]
async fn test_cancel_from_progress_callback() {
    let api = MockApi::start(vec![sse_response(&[
        "data:{\"type\":\"step\",\"step\":\"subject_prep\"}\n\n",
        "data:{\"type\":\"step\",\"step\":\"subject_images\"}\n\n",
        "data:{\"type\":\"complete\",\"data\":{\"mao\":{\"mao\":1}}}\n\n",
    ])])
    .await;
    let state = api.state();
    prepare(&state, &["c1", "c2", "c3"]);

    let response = commands::run_analysis(&state, |_| {
        state.analysis().cancel();
    })
    .await;

    assert_eq!(response.data, Some(AnalysisOutcome::Cancelled));
    let progress = state.analysis().progress();
    assert_eq!(progress.steps.len(), 1);
    assert!(!progress.is_complete);
    assert!(state.comps().analysis().data.is_none());
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let api = MockApi::start(vec![]).await;
    let state = api.state();
    prepare(&state, &[]);

    let response = commands::run_analysis(&state, |_| {}).await;
    assert!(!response.success);
    assert!(api.requests().is_empty());
}
