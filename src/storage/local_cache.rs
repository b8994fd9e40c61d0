//! Local Cache
//!
//! Persists the last property search, the selected property and the session
//! token across runs, on top of the `settings` table. Reads never fail on bad
//! stored data: a value that no longer parses is logged and treated as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::property::Property;
use crate::models::search::SearchFilters;
use crate::storage::database::Database;
use crate::utils::error::AppResult;

pub const SEARCH_RESULTS_KEY: &str = "property_search_results";
pub const SEARCH_FILTERS_KEY: &str = "property_search_filters";
pub const SELECTED_PROPERTY_KEY: &str = "selected_property";
pub const TOKEN_KEY: &str = "token";

/// Prefix of the comp workflow slots written by the comparables store
pub const WORKFLOW_PREFIX: &str = "workflow_";

/// Typed wrapper over the settings KV store
#[derive(Debug, Clone)]
pub struct LocalCache {
    db: Database,
}

impl LocalCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load any JSON value stored under `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(raw) = self.db.get_setting(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable cached value");
                Ok(None)
            }
        }
    }

    /// Store any value as JSON under `key`
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.db.set_setting(key, &raw)
    }

    pub fn remove(&self, key: &str) -> AppResult<()> {
        self.db.delete_setting(key)
    }

    /// Remove every key starting with `prefix`; returns how many were removed
    pub fn remove_prefixed(&self, prefix: &str) -> AppResult<usize> {
        self.db.delete_prefixed(prefix)
    }

    /// Save search results, and the filters that produced them when given.
    ///
    /// An empty result list leaves the previous search untouched.
    pub fn save_search_results(
        &self,
        properties: &[Property],
        filters: Option<&SearchFilters>,
    ) -> AppResult<()> {
        if properties.is_empty() {
            return Ok(());
        }
        self.store(SEARCH_RESULTS_KEY, properties)?;
        if let Some(filters) = filters {
            self.store(SEARCH_FILTERS_KEY, filters)?;
        }
        debug!(count = properties.len(), "Saved search results");
        Ok(())
    }

    pub fn load_search_results(&self) -> AppResult<Option<Vec<Property>>> {
        self.load(SEARCH_RESULTS_KEY)
    }

    pub fn load_search_filters(&self) -> AppResult<Option<SearchFilters>> {
        self.load(SEARCH_FILTERS_KEY)
    }

    /// Remove both the results and their filters
    pub fn clear_search_results(&self) -> AppResult<()> {
        self.db.delete_setting(SEARCH_RESULTS_KEY)?;
        self.db.delete_setting(SEARCH_FILTERS_KEY)?;
        Ok(())
    }

    /// True when results are stored, even if they no longer parse
    pub fn has_search_results(&self) -> bool {
        matches!(self.db.get_setting(SEARCH_RESULTS_KEY), Ok(Some(_)))
    }

    /// Merge `updated` into the stored result with the same `_id`, `zpid` or
    /// `id`. Returns whether anything matched.
    pub fn update_property_in_search_results(&self, updated: &Property) -> AppResult<bool> {
        let Some(mut properties) = self.load_search_results()? else {
            return Ok(false);
        };

        let mut matched = false;
        for property in properties.iter_mut().filter(|p| p.same_record(updated)) {
            property.merge(updated);
            matched = true;
        }

        if matched {
            self.store(SEARCH_RESULTS_KEY, &properties)?;
            debug!("Updated property in stored search results");
        }
        Ok(matched)
    }

    pub fn save_selected_property(&self, property: &Property) -> AppResult<()> {
        self.store(SELECTED_PROPERTY_KEY, property)
    }

    pub fn load_selected_property(&self) -> AppResult<Option<Property>> {
        self.load(SELECTED_PROPERTY_KEY)
    }

    pub fn clear_selected_property(&self) -> AppResult<()> {
        self.db.delete_setting(SELECTED_PROPERTY_KEY)
    }

    pub fn save_token(&self, token: &str) -> AppResult<()> {
        self.db.set_setting(TOKEN_KEY, token)
    }

    pub fn load_token(&self) -> AppResult<Option<String>> {
        Ok(self
            .db
            .get_setting(TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    pub fn clear_token(&self) -> AppResult<()> {
        self.db.delete_setting(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> LocalCache {
        LocalCache::new(Database::new_in_memory().unwrap())
    }

    fn property(value: serde_json::Value) -> Property {
        Property::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_results_are_not_saved() {
        let cache = cache();
        cache
            .save_search_results(&[property(json!({"_id": "1"}))], None)
            .unwrap();
        cache.save_search_results(&[], Some(&SearchFilters::default())).unwrap();

        assert_eq!(cache.load_search_results().unwrap().unwrap().len(), 1);
        assert!(cache.load_search_filters().unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_filters_too() {
        let cache = cache();
        let filters = SearchFilters {
            city: Some("Austin".into()),
            ..SearchFilters::default()
        };
        cache
            .save_search_results(&[property(json!({"_id": "1"}))], Some(&filters))
            .unwrap();
        assert!(cache.has_search_results());
        assert_eq!(cache.load_search_filters().unwrap(), Some(filters));

        cache.clear_search_results().unwrap();
        assert!(!cache.has_search_results());
        assert!(cache.load_search_filters().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_value_reads_as_none() {
        let db = Database::new_in_memory().unwrap();
        db.set_setting(SELECTED_PROPERTY_KEY, "{not json").unwrap();
        let cache = LocalCache::new(db);
        assert!(cache.load_selected_property().unwrap().is_none());
    }

    #[test]
    fn test_update_property_merges_matching_record() {
        let cache = cache();
        cache
            .save_search_results(
                &[
                    property(json!({"_id": "1", "price": 100})),
                    property(json!({"zpid": 42, "price": 200})),
                ],
                None,
            )
            .unwrap();

        let updated = property(json!({"zpid": 42, "uploadedImages": ["https://x/1.jpg"]}));
        assert!(cache.update_property_in_search_results(&updated).unwrap());

        let stored = cache.load_search_results().unwrap().unwrap();
        assert_eq!(stored[1].price(), Some(200.0));
        assert_eq!(stored[1].subject_images(), vec!["https://x/1.jpg"]);
        assert!(stored[0].get("uploadedImages").is_none());

        let stranger = property(json!({"id": "nope"}));
        assert!(!cache.update_property_in_search_results(&stranger).unwrap());
    }

    #[test]
    fn test_update_without_stored_results() {
        let cache = cache();
        assert!(!cache
            .update_property_in_search_results(&property(json!({"_id": "1"})))
            .unwrap());
    }

    #[test]
    fn test_remove_prefixed() {
        let cache = cache();
        cache.store("workflow_mao_inputs", &json!({"maoRule": "70%"})).unwrap();
        cache.store("workflow_selected_comp_ids", &json!(["c1"])).unwrap();
        cache.save_token("jwt").unwrap();

        assert_eq!(cache.remove_prefixed(WORKFLOW_PREFIX).unwrap(), 2);
        assert!(cache.load::<serde_json::Value>("workflow_mao_inputs").unwrap().is_none());
        assert!(cache.load_token().unwrap().is_some());
    }

    #[test]
    fn test_selected_property_and_token() {
        let cache = cache();
        let selected = property(json!({"_id": "abc", "address": "12 Oak St"}));
        cache.save_selected_property(&selected).unwrap();
        assert_eq!(cache.load_selected_property().unwrap(), Some(selected));
        cache.clear_selected_property().unwrap();
        assert!(cache.load_selected_property().unwrap().is_none());

        assert!(cache.load_token().unwrap().is_none());
        cache.save_token("jwt").unwrap();
        assert_eq!(cache.load_token().unwrap().as_deref(), Some("jwt"));
        cache.clear_token().unwrap();
        assert!(cache.load_token().unwrap().is_none());
    }
}
