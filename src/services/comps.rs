//! Comparables Store
//!
//! Working state of the comp workflow: search filters and results, the
//! selected subject property, found comparables, the comp selection, repair
//! and MAO inputs, and the last analysis.
//!
//! Every mutation is written through to the [`LocalCache`] so the workflow
//! survives across CLI invocations; [`ComparablesStore::restore`] reloads it.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use tracing::debug;

use compscope_core::{
    compute_total_repair, AnalysisResult, CompSelection, MaoInputs, MaoInputsUpdate, RepairInputs,
};

use crate::models::analysis::{AnalysisRecord, ComparablesList, SearchResults};
use crate::models::property::Property;
use crate::models::search::SearchFilters;
use crate::storage::local_cache::{LocalCache, WORKFLOW_PREFIX};
use crate::utils::error::{AppError, AppResult};

const COMPARABLES_KEY: &str = "workflow_comparables";
const SELECTION_KEY: &str = "workflow_selected_comp_ids";
const REPAIR_INPUTS_KEY: &str = "workflow_repair_inputs";
const MAO_INPUTS_KEY: &str = "workflow_mao_inputs";
const ANALYSIS_KEY: &str = "workflow_analysis";

#[derive(Debug, Clone, Default)]
struct CompsState {
    search_filters: SearchFilters,
    search_results: SearchResults,
    selected_property: Option<Property>,
    comparables: ComparablesList,
    selection: CompSelection,
    repair_inputs: RepairInputs,
    mao_inputs: MaoInputs,
    analysis: AnalysisRecord,
}

/// Comp workflow state shared by commands and services
#[derive(Debug)]
pub struct ComparablesStore {
    cache: LocalCache,
    state: RwLock<CompsState>,
}

impl ComparablesStore {
    pub fn new(cache: LocalCache) -> Self {
        Self {
            cache,
            state: RwLock::new(CompsState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CompsState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CompsState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> AppResult<T> {
        Ok(self.cache.load(key)?.unwrap_or_default())
    }

    /// Reload the persisted workflow
    pub fn restore(&self) -> AppResult<()> {
        let properties = self.cache.load_search_results()?.unwrap_or_default();
        let restored = CompsState {
            search_filters: self.cache.load_search_filters()?.unwrap_or_default(),
            search_results: SearchResults::found(properties),
            selected_property: self.cache.load_selected_property()?,
            comparables: self.load_or_default(COMPARABLES_KEY)?,
            selection: self.load_or_default(SELECTION_KEY)?,
            repair_inputs: self.load_or_default(REPAIR_INPUTS_KEY)?,
            mao_inputs: self.load_or_default(MAO_INPUTS_KEY)?,
            analysis: self.load_or_default(ANALYSIS_KEY)?,
        };
        debug!(
            results = restored.search_results.count,
            comparables = restored.comparables.count,
            selected = restored.selection.len(),
            "Restored comp workflow"
        );
        *self.write() = restored;
        Ok(())
    }

    /// Clear the whole workflow, in memory and on disk
    pub fn reset(&self) -> AppResult<()> {
        *self.write() = CompsState::default();
        self.cache.clear_search_results()?;
        self.cache.clear_selected_property()?;
        self.cache.remove_prefixed(WORKFLOW_PREFIX)?;
        Ok(())
    }

    pub fn search_filters(&self) -> SearchFilters {
        self.read().search_filters.clone()
    }

    pub fn search_results(&self) -> SearchResults {
        self.read().search_results.clone()
    }

    /// Record a finished search. Non-empty results are persisted with their filters.
    pub fn set_search_results(
        &self,
        results: SearchResults,
        filters: Option<SearchFilters>,
    ) -> AppResult<()> {
        self.cache
            .save_search_results(&results.properties, filters.as_ref())?;
        let mut state = self.write();
        if let Some(filters) = filters {
            state.search_filters = filters;
        }
        state.search_results = results;
        Ok(())
    }

    pub fn selected_property(&self) -> Option<Property> {
        self.read().selected_property.clone()
    }

    /// Make `property` the subject. Uploaded photos replace the listing
    /// photos. Comparables, selection and analysis of the previous subject
    /// are dropped.
    pub fn select_property(&self, mut property: Property, uploaded_images: Vec<String>) -> AppResult<Property> {
        if !uploaded_images.is_empty() {
            property.set("uploadedImages", serde_json::json!(uploaded_images));
            property.set("images", serde_json::json!(uploaded_images));
        }
        self.cache.save_selected_property(&property)?;
        {
            let mut state = self.write();
            state.selected_property = Some(property.clone());
            state.comparables = ComparablesList::default();
            state.selection.clear();
            state.analysis = AnalysisRecord::default();
        }
        self.cache.remove(COMPARABLES_KEY)?;
        self.cache.remove(SELECTION_KEY)?;
        self.cache.remove(ANALYSIS_KEY)?;
        // Subject sqft may have changed
        let inputs = self.repair_inputs();
        self.set_repair_inputs(inputs)?;
        Ok(property)
    }

    /// Replace the subject with a richer copy of itself (e.g. after a detail
    /// fetch). Comparables and selection are kept.
    pub fn update_selected_property(&self, property: Property) -> AppResult<Property> {
        self.cache.save_selected_property(&property)?;
        self.merge_into_results(&property)?;
        self.write().selected_property = Some(property.clone());
        let inputs = self.repair_inputs();
        self.set_repair_inputs(inputs)?;
        Ok(property)
    }

    /// Adopt the database id the server assigned to the subject
    pub fn assign_property_id(&self, id: &str) -> AppResult<Option<Property>> {
        let updated = {
            let mut state = self.write();
            let Some(property) = state.selected_property.as_mut() else {
                return Ok(None);
            };
            if property.get("_id").and_then(|v| v.as_str()) == Some(id) {
                return Ok(Some(property.clone()));
            }
            property.set("_id", serde_json::json!(id));
            property.clone()
        };
        self.cache.save_selected_property(&updated)?;
        self.merge_into_results(&updated)?;
        debug!(id, "Subject property id updated");
        Ok(Some(updated))
    }

    fn merge_into_results(&self, property: &Property) -> AppResult<()> {
        self.cache.update_property_in_search_results(property)?;
        let mut state = self.write();
        for existing in state
            .search_results
            .properties
            .iter_mut()
            .filter(|p| p.same_record(property))
        {
            existing.merge(property);
        }
        Ok(())
    }

    /// Drop the current comparables and selection ahead of a new search
    pub fn begin_find(&self) -> AppResult<()> {
        {
            let mut state = self.write();
            state.comparables = ComparablesList::default();
            state.selection.clear();
        }
        self.cache.remove(COMPARABLES_KEY)?;
        self.cache.remove(SELECTION_KEY)?;
        Ok(())
    }

    pub fn set_comparables(&self, comparables: ComparablesList) -> AppResult<()> {
        self.cache.store(COMPARABLES_KEY, &comparables)?;
        self.write().comparables = comparables;
        Ok(())
    }

    pub fn comparables(&self) -> ComparablesList {
        self.read().comparables.clone()
    }

    pub fn selection(&self) -> CompSelection {
        self.read().selection.clone()
    }

    /// Select or deselect a comparable from the current list
    pub fn toggle_comp(&self, id: &str, selected: bool) -> AppResult<CompSelection> {
        let selection = {
            let mut state = self.write();
            if selected && state.comparables.find(id).is_none() {
                return Err(AppError::not_found(format!(
                    "Comparable {} is not in the current list",
                    id
                )));
            }
            state
                .selection
                .toggle(id, selected)
                .map_err(|e| AppError::validation(e.to_string()))?;
            state.selection.clone()
        };
        self.cache.store(SELECTION_KEY, &selection)?;
        Ok(selection)
    }

    /// Replace the selection wholesale; the cap is checked at analysis time
    pub fn set_selection(&self, selection: CompSelection) -> AppResult<()> {
        self.cache.store(SELECTION_KEY, &selection)?;
        self.write().selection = selection;
        Ok(())
    }

    pub fn repair_inputs(&self) -> RepairInputs {
        self.read().repair_inputs.clone()
    }

    /// Store new repair inputs and push the derived total into the MAO
    /// inputs' repair estimate. Returns the total.
    pub fn set_repair_inputs(&self, inputs: RepairInputs) -> AppResult<u64> {
        let (total, mao) = {
            let mut state = self.write();
            let sqft = state.selected_property.as_ref().and_then(Property::subject_sqft);
            let total = compute_total_repair(&inputs, sqft);
            state.repair_inputs = inputs;
            state.mao_inputs.apply_repair_total(total);
            (total, state.mao_inputs.clone())
        };
        self.cache.store(REPAIR_INPUTS_KEY, &self.repair_inputs())?;
        self.cache.store(MAO_INPUTS_KEY, &mao)?;
        Ok(total)
    }

    pub fn mao_inputs(&self) -> MaoInputs {
        self.read().mao_inputs.clone()
    }

    pub fn update_mao_inputs(&self, update: &MaoInputsUpdate) -> AppResult<MaoInputs> {
        let mao = {
            let mut state = self.write();
            state.mao_inputs.merge(update);
            state.mao_inputs.clone()
        };
        self.cache.store(MAO_INPUTS_KEY, &mao)?;
        Ok(mao)
    }

    pub fn analysis(&self) -> AnalysisRecord {
        self.read().analysis.clone()
    }

    pub fn set_analysis_result(&self, result: AnalysisResult) -> AppResult<()> {
        self.set_analysis(AnalysisRecord {
            data: Some(result),
            error: None,
        })
    }

    pub fn set_analysis_error(&self, error: impl Into<String>) -> AppResult<()> {
        self.set_analysis(AnalysisRecord {
            data: None,
            error: Some(error.into()),
        })
    }

    fn set_analysis(&self, record: AnalysisRecord) -> AppResult<()> {
        self.cache.store(ANALYSIS_KEY, &record)?;
        self.write().analysis = record;
        Ok(())
    }
}
