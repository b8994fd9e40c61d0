//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.
//! `COMPSCOPE_API_BASE_URL` overrides the stored base URL for the current
//! process without being written back.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

/// Environment variable overriding `api_base_url`
pub const BASE_URL_ENV: &str = "COMPSCOPE_API_BASE_URL";

/// Configuration service for managing app settings
#[derive(Debug, Default)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
    base_url_override: Option<String>,
}

impl ConfigService {
    /// Open the config at `path`, creating it with defaults if missing
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        let base_url_override = std::env::var(BASE_URL_ENV)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        if let Some(url) = &base_url_override {
            debug!(url = %url, "API base URL overridden from environment");
        }

        Ok(Self {
            config_path,
            config,
            base_url_override,
        })
    }

    /// In-memory service that never touches disk
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config_path: PathBuf::new(),
            config,
            base_url_override: None,
        }
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective configuration, with environment overrides applied
    pub fn get_config(&self) -> AppConfig {
        let mut config = self.config.clone();
        if let Some(url) = &self.base_url_override {
            config.api_base_url = url.clone();
        }
        config
    }

    /// Update the configuration with a partial update
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut next = self.config.clone();
        next.apply_update(update);
        next.validate().map_err(AppError::validation)?;
        self.config = next;
        self.save()?;
        Ok(self.get_config())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        if self.config_path.as_os_str().is_empty() {
            return Ok(());
        }
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        let on_disk = self.config_path.as_os_str().is_empty() || self.config_path.exists();
        on_disk && self.get_config().validate().is_ok()
    }
}
