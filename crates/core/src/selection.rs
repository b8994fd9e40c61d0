//! Comparable Selection
//!
//! The user picks up to [`MAX_SELECTED_COMPS`] sold comparables before an
//! analysis can start. Three or more are recommended.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CoreError, CoreResult};

pub const MAX_SELECTED_COMPS: usize = 5;
pub const RECOMMENDED_MIN_COMPS: usize = 3;

const SELECTION_REQUIRED: &str =
    "Please select at least 1 comparable (3-5 recommended for accurate results)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Maximum {MAX_SELECTED_COMPS} comparables allowed. Please deselect some comparables.")]
    Full,
}

/// Result of a successful pre-analysis check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCheck {
    pub count: usize,
    /// Fewer than the recommended number of comparables; the run may proceed
    /// but the user should be warned.
    pub below_recommended: bool,
}

/// Ordered set of selected comparable ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompSelection {
    ids: Vec<String>,
}

impl CompSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from stored ids, dropping duplicates. The cap is
    /// not applied here so an over-full selection can still be reported by
    /// [`CompSelection::validate_for_analysis`].
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for id in ids {
            let id = id.into();
            if !selection.contains(&id) {
                selection.ids.push(id);
            }
        }
        selection
    }

    pub fn select(&mut self, id: impl Into<String>) -> Result<(), SelectionError> {
        let id = id.into();
        if self.contains(&id) {
            return Ok(());
        }
        if self.ids.len() >= MAX_SELECTED_COMPS {
            return Err(SelectionError::Full);
        }
        self.ids.push(id);
        Ok(())
    }

    /// Remove `id`; returns whether it was selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: &str, selected: bool) -> Result<(), SelectionError> {
        if selected {
            self.select(id)
        } else {
            self.deselect(id);
            Ok(())
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Check the selection before starting an analysis.
    pub fn validate_for_analysis(&self) -> CoreResult<SelectionCheck> {
        let count = self.ids.len();
        if count == 0 || count > MAX_SELECTED_COMPS {
            return Err(CoreError::validation(SELECTION_REQUIRED));
        }
        Ok(SelectionCheck {
            count,
            below_recommended: count < RECOMMENDED_MIN_COMPS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_up_to_cap() {
        let mut selection = CompSelection::new();
        for i in 0..MAX_SELECTED_COMPS {
            selection.select(format!("c{}", i)).unwrap();
        }
        assert_eq!(selection.select("c9"), Err(SelectionError::Full));
        assert_eq!(selection.len(), MAX_SELECTED_COMPS);
        assert!(!selection.contains("c9"));
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut selection = CompSelection::new();
        selection.select("a").unwrap();
        selection.select("a").unwrap();
        assert_eq!(selection.ids(), &["a".to_string()]);
    }

    #[test]
    fn test_reselect_when_full_is_not_an_error() {
        let mut selection = CompSelection::from_ids(["a", "b", "c", "d", "e"]);
        assert!(selection.select("c").is_ok());
    }

    #[test]
    fn test_toggle_and_deselect() {
        let mut selection = CompSelection::new();
        selection.toggle("a", true).unwrap();
        selection.toggle("b", true).unwrap();
        selection.toggle("a", false).unwrap();
        assert_eq!(selection.ids(), &["b".to_string()]);
        assert!(!selection.deselect("zzz"));
    }

    #[test]
    fn test_validate_empty_selection() {
        let err = CompSelection::new().validate_for_analysis().unwrap_err();
        assert!(err.is_validation());
        assert!(err
            .to_string()
            .contains("Please select at least 1 comparable (3-5 recommended for accurate results)"));
    }

    #[test]
    fn test_validate_overfull_selection() {
        let selection = CompSelection::from_ids(["a", "b", "c", "d", "e", "f"]);
        assert!(selection.validate_for_analysis().is_err());
    }

    #[test]
    fn test_validate_below_recommended() {
        let check = CompSelection::from_ids(["a", "b"]).validate_for_analysis().unwrap();
        assert_eq!(check.count, 2);
        assert!(check.below_recommended);

        let check = CompSelection::from_ids(["a", "b", "c"]).validate_for_analysis().unwrap();
        assert!(!check.below_recommended);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let selection = CompSelection::from_ids(["a", "b", "a"]);
        assert_eq!(serde_json::to_string(&selection).unwrap(), r#"["a","b"]"#);
    }
}
