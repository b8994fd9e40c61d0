//! Analysis Service
//!
//! Runs the streamed comp analysis for the selected property: validates the
//! request, keeps a live progress snapshot while steps arrive, and records
//! the outcome in the comparables store. One run at a time.

use std::sync::{Arc, Mutex, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use compscope_client::{AnalyzeSelectedRequest, ApiClient, ErrorContext, StreamOutcome};
use compscope_core::{AnalysisProgress, StepEvent, StepView};

use crate::models::analysis::{few_comps_warning, AnalysisOutcome};
use crate::services::comps::ComparablesStore;
use crate::services::notice::Notifier;
use crate::utils::error::{AppError, AppResult};

const NO_RESULT_MESSAGE: &str = "Analysis did not return results.";
const COMPLETED_MESSAGE: &str = "Property analysis completed successfully!";

#[derive(Debug, Clone)]
struct ActiveRun {
    id: Uuid,
    cancel: CancellationToken,
}

/// Clears the active slot when the run ends, however it ends
struct RunGuard<'a> {
    active: &'a Mutex<Option<ActiveRun>>,
    id: Uuid,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.as_ref().map(|run| run.id) == Some(self.id) {
            *active = None;
        }
    }
}

/// Single-flight analysis runner with a shared progress snapshot
#[derive(Debug, Default)]
pub struct AnalysisService {
    active: Mutex<Option<ActiveRun>>,
    progress: Arc<RwLock<AnalysisProgress>>,
}

impl AnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current progress snapshot
    pub fn progress(&self) -> AnalysisProgress {
        self.progress
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn step_views(&self) -> Vec<StepView> {
        self.progress().visible_steps()
    }

    /// Forget the last run's progress
    pub fn reset_progress(&self) {
        *self.progress.write().unwrap_or_else(|e| e.into_inner()) = AnalysisProgress::default();
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Cancel the active run. Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.as_ref() {
            Some(run) => {
                info!(run_id = %run.id, "Cancelling analysis");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn claim(&self) -> AppResult<ActiveRun> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.is_some() {
            return Err(AppError::Busy);
        }
        let run = ActiveRun {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };
        *active = Some(run.clone());
        Ok(run)
    }

    fn update<R>(&self, f: impl FnOnce(&mut AnalysisProgress) -> R) -> R {
        let mut progress = self.progress.write().unwrap_or_else(|e| e.into_inner());
        f(&mut progress)
    }

    /// Run the analysis for the selected property and comp selection.
    ///
    /// `on_progress` sees the snapshot after every step event. Validation
    /// failures return before anything is sent. HTTP failures are reported
    /// through `notifier`, recorded as the analysis error, and returned.
    pub async fn run<F>(
        &self,
        api: &ApiClient,
        comps: &ComparablesStore,
        notifier: &Notifier,
        mut on_progress: F,
    ) -> AppResult<AnalysisOutcome>
    where
        F: FnMut(&AnalysisProgress),
    {
        let property = comps
            .selected_property()
            .ok_or_else(|| AppError::validation("Property ID is required"))?;
        let property_id = property
            .any_id()
            .ok_or_else(|| AppError::validation("Property ID is required"))?;

        let selection = comps.selection();
        let check = selection.validate_for_analysis()?;
        if check.below_recommended {
            notifier.warning(few_comps_warning(check.count));
        }

        let run = self.claim()?;
        let _guard = RunGuard {
            active: &self.active,
            id: run.id,
        };

        let subject_address = property
            .display_address()
            .or_else(|| property.get("rawAddress").and_then(|v| v.as_str()).map(str::to_string));
        self.update(|p| *p = AnalysisProgress::start(subject_address, check.count));

        let request = AnalyzeSelectedRequest {
            property_id: property_id.clone(),
            selected_comp_ids: selection.ids().to_vec(),
            mao_inputs: comps.mao_inputs(),
            subject_images: property.subject_images(),
        };
        info!(
            run_id = %run.id,
            property_id = %property_id,
            comps = check.count,
            "Starting analysis"
        );

        let outcome = api
            .analyze_selected_stream(&request, &run.cancel, |event: &StepEvent| {
                debug!(run_id = %run.id, step = %event.step, "Analysis step");
                let snapshot = self.update(|p| {
                    p.apply_step(event);
                    p.clone()
                });
                on_progress(&snapshot);
            })
            .await;

        match outcome {
            Ok(StreamOutcome::Completed(result)) => {
                self.update(AnalysisProgress::mark_complete);
                comps.set_analysis_result(result.clone())?;
                notifier.success(COMPLETED_MESSAGE);
                info!(run_id = %run.id, "Analysis complete");
                Ok(AnalysisOutcome::Completed { result })
            }
            Ok(StreamOutcome::Ended) => {
                self.update(|p| p.is_complete = false);
                notifier.error(NO_RESULT_MESSAGE);
                warn!(run_id = %run.id, "Analysis stream ended without a result");
                Ok(AnalysisOutcome::NoResult)
            }
            Ok(StreamOutcome::Cancelled) => {
                info!(run_id = %run.id, "Analysis cancelled");
                Ok(AnalysisOutcome::Cancelled)
            }
            Err(e) => {
                self.update(|p| p.is_complete = false);
                notifier.error(e.user_message(ErrorContext::Analysis));
                let recorded = e.server_message().unwrap_or("Analysis failed").to_string();
                comps.set_analysis_error(recorded)?;
                warn!(run_id = %run.id, error = %e, "Analysis failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::Property;
    use crate::services::notice::NoticeLevel;
    use crate::storage::database::Database;
    use crate::storage::local_cache::LocalCache;
    use compscope_core::CompSelection;
    use serde_json::json;

    fn api() -> ApiClient {
        // Nothing listens here; tests below must fail before any request.
        ApiClient::new("http://127.0.0.1:9/api", reqwest::Client::new()).unwrap()
    }

    fn store() -> ComparablesStore {
        ComparablesStore::new(LocalCache::new(Database::new_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_requires_selected_property() {
        let service = AnalysisService::new();
        let err = service
            .run(&api(), &store(), &Notifier::new(), |_| {})
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.user_message(ErrorContext::Analysis), "Property ID is required");
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized_selection() {
        let comps = store();
        comps
            .select_property(Property::from_value(json!({"_id": "p1"})).unwrap(), vec![])
            .unwrap();
        let service = AnalysisService::new();

        let err = service
            .run(&api(), &comps, &Notifier::new(), |_| {})
            .await
            .unwrap_err();
        assert!(err.is_validation());

        comps
            .set_selection(CompSelection::from_ids(["a", "b", "c", "d", "e", "f"]))
            .unwrap();
        let err = service
            .run(&api(), &comps, &Notifier::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(ErrorContext::Analysis),
            "Please select at least 1 comparable (3-5 recommended for accurate results)"
        );
        assert!(!service.is_running());
        assert_eq!(service.progress(), AnalysisProgress::default());
    }

    #[tokio::test]
    async fn test_busy_while_another_run_is_active() {
        let comps = store();
        comps
            .select_property(Property::from_value(json!({"_id": "p1"})).unwrap(), vec![])
            .unwrap();
        comps
            .set_selection(CompSelection::from_ids(["a", "b", "c"]))
            .unwrap();
        let service = AnalysisService::new();
        let _held = service.claim().unwrap();

        let err = service
            .run(&api(), &comps, &Notifier::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Busy));
    }

    #[tokio::test]
    async fn test_few_comps_warning_is_sent() {
        let comps = store();
        comps
            .select_property(Property::from_value(json!({"_id": "p1"})).unwrap(), vec![])
            .unwrap();
        comps.set_selection(CompSelection::from_ids(["a"])).unwrap();
        let notifier = Notifier::new();
        let mut notices = notifier.subscribe();
        let service = AnalysisService::new();
        let _held = service.claim().unwrap();

        let _ = service.run(&api(), &comps, &notifier, |_| {}).await;
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.starts_with("Only 1 comparable selected."));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let service = AnalysisService::new();
        assert!(!service.cancel());
        let run = service.claim().unwrap();
        assert!(service.cancel());
        assert!(service.cancel());
        assert!(run.cancel.is_cancelled());
    }

    #[test]
    fn test_reset_progress() {
        let service = AnalysisService::new();
        service.update(|p| *p = AnalysisProgress::start(Some("12 Oak St".into()), 3));
        assert_eq!(service.progress().comp_total, Some(3));
        service.reset_progress();
        assert_eq!(service.progress(), AnalysisProgress::default());
    }
}
