//! Settings Commands
//!
//! Commands for reading and updating application settings.

use crate::models::response::CommandResponse;
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::state::AppState;

/// Get current application settings
pub async fn get_settings(state: &AppState) -> CommandResponse<AppConfig> {
    CommandResponse::ok(state.get_config().await)
}

/// Update application settings with a partial update
pub async fn update_settings(state: &AppState, update: SettingsUpdate) -> CommandResponse<AppConfig> {
    state.update_config(update).await.into()
}

/// Update a single setting given as `key value`
pub async fn set_setting(state: &AppState, key: &str, value: &str) -> CommandResponse<AppConfig> {
    match SettingsUpdate::from_key_value(key, value) {
        Ok(update) => update_settings(state, update).await,
        Err(message) => CommandResponse::err(message),
    }
}
