//! Application State
//!
//! Container for every long-lived service, created once at startup and passed
//! by reference to commands.

use std::path::Path;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use compscope_client::{build_http_client, ApiClient, HttpSettings};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::analysis::AnalysisService;
use crate::services::comps::ComparablesStore;
use crate::services::notice::Notifier;
use crate::storage::{ConfigService, Database, LocalCache};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_file, database_file, ensure_compscope_dir, ensure_dir};

/// Environment variable supplying a session token without `compscope login`
pub const TOKEN_ENV: &str = "COMPSCOPE_TOKEN";
/// Proxy password; never written to the config file
pub const PROXY_PASSWORD_ENV: &str = "COMPSCOPE_PROXY_PASSWORD";

/// Application state shared by all commands
pub struct AppState {
    /// JSON configuration
    config: RwLock<ConfigService>,
    /// SQLite settings store
    database: Database,
    /// Typed cache over the settings store
    cache: LocalCache,
    /// Comp workflow state
    comps: ComparablesStore,
    /// Streamed analysis runner
    analysis: AnalysisService,
    notifier: Notifier,
    /// Token from the environment; wins over the stored one
    token_override: Option<String>,
}

impl AppState {
    /// Open the state under the default application directory
    pub fn new() -> AppResult<Self> {
        Self::open(&ensure_compscope_dir()?)
    }

    /// Open the state stored under `dir` and restore the comp workflow
    pub fn open(dir: &Path) -> AppResult<Self> {
        ensure_dir(dir)?;
        let config = ConfigService::open(config_file(dir))?;
        let database = Database::open(&database_file(dir))?;
        let token_override = std::env::var(TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let state = Self::assemble(config, database, token_override);
        state.comps.restore()?;
        debug!(dir = %dir.display(), "Application state opened");
        Ok(state)
    }

    /// Fully in-memory state for tests
    pub fn in_memory(config: AppConfig) -> AppResult<Self> {
        Ok(Self::assemble(
            ConfigService::in_memory(config),
            Database::new_in_memory()?,
            None,
        ))
    }

    fn assemble(config: ConfigService, database: Database, token_override: Option<String>) -> Self {
        let cache = LocalCache::new(database.clone());
        Self {
            config: RwLock::new(config),
            comps: ComparablesStore::new(cache.clone()),
            cache,
            database,
            analysis: AnalysisService::new(),
            notifier: Notifier::new(),
            token_override,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn comps(&self) -> &ComparablesStore {
        &self.comps
    }

    pub fn analysis(&self) -> &AnalysisService {
        &self.analysis
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Check if database is healthy
    pub fn is_database_healthy(&self) -> bool {
        self.database.is_healthy()
    }

    /// Check if config is healthy
    pub fn is_config_healthy(&self) -> bool {
        // Use try_read to avoid blocking
        match self.config.try_read() {
            Ok(config) => config.is_healthy(),
            Err(_) => false,
        }
    }

    /// Get the effective configuration
    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.get_config()
    }

    /// Update the configuration
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        self.config.write().await.update_config(update)
    }

    /// Current session token, if any
    pub fn token(&self) -> AppResult<Option<String>> {
        match &self.token_override {
            Some(token) => Ok(Some(token.clone())),
            None => self.cache.load_token(),
        }
    }

    /// Token or `Unauthenticated`
    pub fn require_token(&self) -> AppResult<String> {
        self.token()?.ok_or(AppError::Unauthenticated)
    }

    pub fn save_token(&self, token: &str) -> AppResult<()> {
        self.cache.save_token(token)
    }

    pub fn clear_token(&self) -> AppResult<()> {
        self.cache.clear_token()
    }

    /// Build an API client from the current config and token
    pub async fn api_client(&self) -> AppResult<ApiClient> {
        let config = self.get_config().await;
        let http = build_http_client(&HttpSettings {
            proxy: config.proxy.clone(),
            proxy_password: std::env::var(PROXY_PASSWORD_ENV).ok().filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        })?;
        let client = ApiClient::new(&config.api_base_url, http)?
            .with_token(self.token()?)
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs));
        Ok(client)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("database", &self.database)
            .field("analysis_running", &self.analysis.is_running())
            .finish()
    }
}
