//! Analysis Progress
//!
//! Snapshot of a running analysis, folded from [`StreamEvent`]s, plus the
//! derived views the progress screen renders.

use serde::{Deserialize, Serialize};

use crate::format::format_currency;
use crate::streaming::{AnalysisResult, StepEvent, StepId, StreamEvent};

/// Display status of one step relative to the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Active,
    Done,
}

/// One row of the rendered step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepView {
    pub step: StepId,
    /// 1-based position in the canonical order.
    pub number: usize,
    pub label: String,
    pub status: StepStatus,
}

/// Progress snapshot of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisProgress {
    pub subject_address: Option<String>,
    /// Every step event received so far, in arrival order.
    pub steps: Vec<StepEvent>,
    pub current_step: Option<StepId>,
    pub comp_being_analyzed: Option<String>,
    pub comp_index: Option<u32>,
    pub comp_total: Option<u32>,
    pub arv: Option<f64>,
    pub mao: Option<f64>,
    pub estimated_repairs: Option<f64>,
    pub is_complete: bool,
}

impl AnalysisProgress {
    /// State at the start of a run over `comp_total` selected comparables.
    pub fn start(subject_address: Option<String>, comp_total: usize) -> Self {
        Self {
            subject_address,
            current_step: Some(StepId::SubjectPrep),
            comp_total: u32::try_from(comp_total).ok(),
            ..Self::default()
        }
    }

    /// Fold one event into the snapshot.
    ///
    /// Returns the final analysis when `event` is the completion event.
    pub fn apply<'a>(&mut self, event: &'a StreamEvent) -> Option<&'a AnalysisResult> {
        match event {
            StreamEvent::Step(step) => {
                self.apply_step(step);
                None
            }
            StreamEvent::Complete { data } => {
                self.mark_complete();
                Some(data)
            }
            StreamEvent::Unknown => None,
        }
    }

    /// Pure form of [`AnalysisProgress::apply`].
    pub fn reduce(mut self, event: &StreamEvent) -> Self {
        self.apply(event);
        self
    }

    /// Mark the run finished with a result.
    pub fn mark_complete(&mut self) {
        self.is_complete = true;
        self.current_step = Some(StepId::Complete);
    }

    /// Fold one step event into the snapshot.
    pub fn apply_step(&mut self, event: &StepEvent) {
        self.steps.push(event.clone());
        self.current_step = Some(event.step);

        if let Some(address) = &event.address {
            self.comp_being_analyzed = Some(address.clone());
        }
        if event.index.is_some() {
            self.comp_index = event.index;
        }
        if event.total.is_some() {
            self.comp_total = event.total;
        }
        if event.arv.is_some() {
            self.arv = event.arv;
        }
        if event.mao.is_some() {
            self.mao = event.mao;
        }
        if event.estimated_repairs.is_some() {
            self.estimated_repairs = event.estimated_repairs;
        }
    }

    pub fn step_status(&self, step: StepId) -> StepStatus {
        let Some(current) = self.current_step else {
            return StepStatus::Pending;
        };
        if step.position() < current.position() {
            StepStatus::Done
        } else if step == current {
            StepStatus::Active
        } else {
            StepStatus::Pending
        }
    }

    /// Whether at least one comparable event has been received.
    pub fn has_comp_events(&self) -> bool {
        self.steps.iter().any(|e| e.step == StepId::Comp)
    }

    /// Ordered step list for the progress screen. The comparable step only
    /// shows up once the server has reported one.
    pub fn visible_steps(&self) -> Vec<StepView> {
        let show_comp = self.has_comp_events();
        StepId::ALL
            .into_iter()
            .filter(|step| *step != StepId::Comp || show_comp)
            .map(|step| StepView {
                step,
                number: step.position() + 1,
                label: self.step_label(step),
                status: self.step_status(step),
            })
            .collect()
    }

    fn step_label(&self, step: StepId) -> String {
        match (step, self.comp_index, self.comp_total) {
            (StepId::Comp, Some(index), Some(total)) => {
                format!("Analyzing comparables ({} of {})", index, total)
            }
            _ => step.label().to_string(),
        }
    }

    /// Text of the "current step" banner, or `None` once the run is done.
    pub fn current_activity(&self) -> Option<String> {
        if self.is_complete {
            return None;
        }
        let current = self.current_step?;

        if current == StepId::Comp {
            if let Some(address) = &self.comp_being_analyzed {
                return Some(format!(
                    "Analyzing comparable {} of {}: {}",
                    display_count(self.comp_index),
                    display_count(self.comp_total),
                    address
                ));
            }
        }

        let value = match current {
            StepId::RepairsDone => self.estimated_repairs,
            StepId::ArvDone => self.arv,
            StepId::MaoDone => self.mao,
            _ => None,
        };
        Some(match value {
            Some(v) => format!("{} {}", current.label(), format_currency(Some(v))),
            None => current.label().to_string(),
        })
    }
}

fn display_count(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn step(id: StepId) -> StreamEvent {
        StreamEvent::Step(StepEvent::new(id))
    }

    fn complete(arv: f64) -> StreamEvent {
        StreamEvent::Complete {
            data: AnalysisResult::new(serde_json::json!({"analysis": {"arv": arv}})),
        }
    }

    #[test]
    fn test_start_state() {
        let progress = AnalysisProgress::start(Some("1 Main St".to_string()), 4);
        assert_eq!(progress.current_step, Some(StepId::SubjectPrep));
        assert_eq!(progress.comp_total, Some(4));
        assert!(progress.steps.is_empty());
        assert!(!progress.is_complete);
    }

    #[test]
    fn test_default_is_idle() {
        let progress = AnalysisProgress::default();
        assert!(progress.current_step.is_none());
        assert!(progress.current_activity().is_none());
        assert!(progress
            .visible_steps()
            .iter()
            .all(|v| v.status == StepStatus::Pending));
    }

    #[test]
    fn test_step_events_accumulate() {
        let progress = AnalysisProgress::start(None, 3)
            .reduce(&step(StepId::SubjectPrep))
            .reduce(&step(StepId::SubjectImages))
            .reduce(&StreamEvent::Step(StepEvent::comp("12 Oak St", 1, 3)));

        assert_eq!(progress.steps.len(), 3);
        assert_eq!(progress.current_step, Some(StepId::Comp));
        assert_eq!(progress.comp_being_analyzed.as_deref(), Some("12 Oak St"));
        assert_eq!(progress.comp_index, Some(1));
        assert_eq!(progress.comp_total, Some(3));
    }

    #[test]
    fn test_values_never_revert_to_absent() {
        let mut arv_done = StepEvent::new(StepId::ArvDone);
        arv_done.arv = Some(310000.0);

        let progress = AnalysisProgress::default()
            .reduce(&StreamEvent::Step(StepEvent::comp("12 Oak St", 2, 3)))
            .reduce(&StreamEvent::Step(arv_done))
            .reduce(&step(StepId::Mao));

        assert_eq!(progress.arv, Some(310000.0));
        assert_eq!(progress.comp_index, Some(2));
        assert_eq!(progress.comp_being_analyzed.as_deref(), Some("12 Oak St"));
    }

    #[test]
    fn test_complete_event_returns_result() {
        let mut progress = AnalysisProgress::start(None, 3);
        progress.apply(&step(StepId::DealScore));
        let event = complete(300000.0);
        let result = progress.apply(&event).cloned();

        assert_eq!(result.and_then(|r| r.arv()), Some(300000.0));
        assert!(progress.is_complete);
        assert_eq!(progress.current_step, Some(StepId::Complete));
        assert!(progress.current_activity().is_none());
        // Completion is not recorded as a step
        assert_eq!(progress.steps.len(), 1);
    }

    #[test]
    fn test_unknown_event_changes_nothing() {
        let before = AnalysisProgress::start(Some("1 Main St".to_string()), 2);
        let after = before.clone().reduce(&StreamEvent::Unknown);
        assert_eq!(before, after);
    }

    #[test]
    fn test_step_status_by_position() {
        let progress = AnalysisProgress::default().reduce(&step(StepId::Arv));
        assert_eq!(progress.step_status(StepId::SubjectPrep), StepStatus::Done);
        assert_eq!(progress.step_status(StepId::RepairsDone), StepStatus::Done);
        assert_eq!(progress.step_status(StepId::Arv), StepStatus::Active);
        assert_eq!(progress.step_status(StepId::ArvDone), StepStatus::Pending);
        assert_eq!(progress.step_status(StepId::Complete), StepStatus::Pending);
    }

    #[test]
    fn test_comp_step_hidden_until_seen() {
        let progress = AnalysisProgress::start(None, 3).reduce(&step(StepId::SubjectDone));
        let views = progress.visible_steps();
        assert_eq!(views.len(), 11);
        assert!(views.iter().all(|v| v.step != StepId::Comp));
        // Numbers follow the canonical order even with the comp row hidden
        assert_eq!(views[3].step, StepId::Repairs);
        assert_eq!(views[3].number, 5);
    }

    #[test]
    fn test_comp_step_label_with_counts() {
        let progress = AnalysisProgress::start(None, 4)
            .reduce(&StreamEvent::Step(StepEvent::comp("9 Elm Ave", 2, 4)));
        let views = progress.visible_steps();
        assert_eq!(views.len(), 12);
        let comp = views.iter().find(|v| v.step == StepId::Comp).unwrap();
        assert_eq!(comp.label, "Analyzing comparables (2 of 4)");
        assert_eq!(comp.status, StepStatus::Active);
    }

    #[test]
    fn test_current_activity_for_comp() {
        let progress = AnalysisProgress::start(None, 4)
            .reduce(&StreamEvent::Step(StepEvent::comp("9 Elm Ave", 2, 4)));
        assert_eq!(
            progress.current_activity().as_deref(),
            Some("Analyzing comparable 2 of 4: 9 Elm Ave")
        );
    }

    #[test]
    fn test_current_activity_with_value() {
        let mut repairs_done = StepEvent::new(StepId::RepairsDone);
        repairs_done.estimated_repairs = Some(62150.0);
        let progress = AnalysisProgress::default().reduce(&StreamEvent::Step(repairs_done));
        assert_eq!(
            progress.current_activity().as_deref(),
            Some("Repair estimates calculated $62,150")
        );

        let progress = progress.reduce(&step(StepId::Arv));
        assert_eq!(
            progress.current_activity().as_deref(),
            Some("Calculating After Repair Value (ARV)")
        );
    }

    #[test]
    fn test_comp_address_not_shown_after_comp_step() {
        let progress = AnalysisProgress::default()
            .reduce(&StreamEvent::Step(StepEvent::comp("9 Elm Ave", 1, 1)))
            .reduce(&step(StepId::Repairs));
        assert_eq!(
            progress.current_activity().as_deref(),
            Some("Calculating repair estimates")
        );
    }
}
