//! Analysis Commands
//!
//! Start, watch and cancel the streamed comp analysis.

use compscope_client::ErrorContext;
use compscope_core::{AnalysisProgress, StepView};

use crate::models::analysis::{AnalysisOutcome, AnalysisRecord};
use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;

/// Run the analysis for the selected subject and comps.
///
/// `on_progress` is called with a fresh snapshot after every step event.
pub async fn run_analysis<F>(state: &AppState, on_progress: F) -> CommandResponse<AnalysisOutcome>
where
    F: FnMut(&AnalysisProgress),
{
    let result: AppResult<AnalysisOutcome> = async {
        let api = state.api_client().await?;
        state
            .analysis()
            .run(&api, state.comps(), state.notifier(), on_progress)
            .await
    }
    .await;
    CommandResponse::from_result(result, ErrorContext::Analysis)
}

/// Cancel the running analysis; `false` when nothing was running
pub fn cancel_analysis(state: &AppState) -> CommandResponse<bool> {
    CommandResponse::ok(state.analysis().cancel())
}

pub fn get_progress(state: &AppState) -> CommandResponse<AnalysisProgress> {
    CommandResponse::ok(state.analysis().progress())
}

/// Step list as shown while the analysis runs
pub fn get_step_views(state: &AppState) -> CommandResponse<Vec<StepView>> {
    CommandResponse::ok(state.analysis().step_views())
}

pub fn reset_progress(state: &AppState) -> CommandResponse<bool> {
    state.analysis().reset_progress();
    CommandResponse::ok(true)
}

/// Last stored analysis result or error
pub fn get_stored_analysis(state: &AppState) -> CommandResponse<AnalysisRecord> {
    CommandResponse::ok(state.comps().analysis())
}

/// Start the workflow over: progress, search, subject, comps and analysis
pub fn reset_workflow(state: &AppState) -> CommandResponse<bool> {
    if state.analysis().is_running() {
        return CommandResponse::err("Cannot reset while an analysis is running");
    }
    state.analysis().reset_progress();
    state.comps().reset().map(|_| true).into()
}
