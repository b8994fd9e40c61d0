//! The comp workflow survives a restart of the CLI.

use pretty_assertions::assert_eq;
use serde_json::json;

use compscope::commands;
use compscope::models::analysis::ComparablesList;
use compscope::models::property::Property;
use compscope::AppState;
use compscope_core::{MaoInputsUpdate, MaoRule, RepairInputs};

fn seed(state: &AppState) {
    let subject = Property::from_value(json!({
        "_id": "subject-1",
        "address": "12 Oak St",
        "squareFootage": 2000
    }))
    .unwrap();
    state.comps().select_property(subject, vec![]).unwrap();
    let data: Vec<Property> = ["c1", "c2"]
        .iter()
        .map(|id| Property::from_value(json!({"_id": id})).unwrap())
        .collect();
    state
        .comps()
        .set_comparables(ComparablesList {
            count: 2,
            data,
            error: None,
        })
        .unwrap();
    state.comps().toggle_comp("c2", true).unwrap();
    state
        .comps()
        .set_repair_inputs(RepairInputs {
            rehab_per_sqft: 30.0,
            ..RepairInputs::default()
        })
        .unwrap();
    state
        .comps()
        .update_mao_inputs(&MaoInputsUpdate {
            mao_rule: Some(MaoRule::SixtyFivePercent),
            ..MaoInputsUpdate::default()
        })
        .unwrap();
    state.save_token("persisted-token").unwrap();
}

#[test]
fn test_workflow_restored_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    seed(&AppState::open(dir.path()).unwrap());

    let state = AppState::open(dir.path()).unwrap();
    let subject = state.comps().selected_property().unwrap();
    assert_eq!(subject.any_id().as_deref(), Some("subject-1"));
    assert_eq!(state.comps().comparables().count, 2);
    assert!(state.comps().selection().contains("c2"));
    assert_eq!(state.comps().repair_inputs().rehab_per_sqft, 30.0);

    let mao = state.comps().mao_inputs();
    assert_eq!(mao.mao_rule, MaoRule::SixtyFivePercent);
    assert_eq!(mao.estimated_repairs, 60000.0);
}

#[test]
fn test_selecting_a_new_subject_drops_comparables() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state = AppState::open(dir.path()).unwrap();
        seed(&state);
        let other = Property::from_value(json!({"_id": "subject-2"})).unwrap();
        state.comps().select_property(other, vec![]).unwrap();
    }

    let state = AppState::open(dir.path()).unwrap();
    assert!(state.comps().comparables().is_empty());
    assert!(state.comps().selection().is_empty());
    // Rate is kept; the total follows the new subject's missing sqft
    assert_eq!(state.comps().repair_inputs().rehab_per_sqft, 30.0);
    assert_eq!(state.comps().mao_inputs().estimated_repairs, 0.0);
}

#[test]
fn test_reset_clears_workflow_but_keeps_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state = AppState::open(dir.path()).unwrap();
        seed(&state);
        let response = commands::reset_workflow(&state);
        assert_eq!(response.data, Some(true));
    }

    let state = AppState::open(dir.path()).unwrap();
    assert!(state.comps().selected_property().is_none());
    assert!(state.comps().comparables().is_empty());
    assert_eq!(state.comps().repair_inputs(), RepairInputs::default());
    assert_eq!(state.token().unwrap().as_deref(), Some("persisted-token"));
}
