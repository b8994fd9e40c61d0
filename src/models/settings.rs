//! Settings Models
//!
//! Application configuration and settings data structures.

use serde::{Deserialize, Serialize};
use url::Url;

use compscope_core::ProxyConfig;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the compscope API, including the `/api` prefix
    pub api_base_url: String,
    /// Timeout for non-streaming API calls, in seconds
    pub request_timeout_secs: u64,
    /// TCP connect timeout, in seconds
    pub connect_timeout_secs: u64,
    /// Optional proxy for all API traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            proxy: None,
            log_level: default_log_level(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub proxy: Option<ProxyConfig>,
    /// Remove the configured proxy
    #[serde(default)]
    pub clear_proxy: bool,
    pub log_level: Option<String>,
}

impl SettingsUpdate {
    /// Build an update from a `key value` pair as typed on the command line.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        let mut update = Self::default();
        match key {
            "api_base_url" => update.api_base_url = Some(value.trim().to_string()),
            "request_timeout_secs" => {
                update.request_timeout_secs = Some(parse_secs(key, value)?);
            }
            "connect_timeout_secs" => {
                update.connect_timeout_secs = Some(parse_secs(key, value)?);
            }
            "log_level" => update.log_level = Some(value.trim().to_string()),
            "proxy" if value.trim().is_empty() || value.trim() == "none" => {
                update.clear_proxy = true;
            }
            "proxy" => {
                update.proxy = Some(ProxyConfig::parse(value).map_err(|e| e.to_string())?);
            }
            other => return Err(format!("Unknown setting: {}", other)),
        }
        Ok(update)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("{} must be a whole number of seconds", key))
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = update.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = update.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if update.clear_proxy {
            self.proxy = None;
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(level) = update.log_level {
            self.log_level = level;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| format!("Invalid api_base_url {}: {}", self.api_base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Invalid api_base_url {}: must be http or https",
                self.api_base_url
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 600 {
            return Err("request_timeout_secs must be between 1 and 600".to_string());
        }

        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 120 {
            return Err("connect_timeout_secs must be between 1 and 120".to_string());
        }

        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() {
                return Err("proxy host cannot be empty".to_string());
            }
        }

        if !["error", "warn", "info", "debug", "trace"].contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level: {}. Must be one of error, warn, info, debug, trace",
                self.log_level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compscope_core::ProxyProtocol;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, "http://localhost:4000/api");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = AppConfig {
            api_base_url: "localhost:4000".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeouts() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_update() {
        let mut config = AppConfig::default();
        config.apply_update(SettingsUpdate {
            api_base_url: Some("https://comps.example.com/api/".to_string()),
            proxy: Some(ProxyConfig {
                protocol: ProxyProtocol::Http,
                host: "proxy.local".to_string(),
                port: 3128,
                username: None,
            }),
            ..SettingsUpdate::default()
        });
        assert_eq!(config.api_base_url, "https://comps.example.com/api");
        assert!(config.proxy.is_some());

        config.apply_update(SettingsUpdate {
            clear_proxy: true,
            ..SettingsUpdate::default()
        });
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_update_from_key_value() {
        let update = SettingsUpdate::from_key_value("request_timeout_secs", "90").unwrap();
        assert_eq!(update.request_timeout_secs, Some(90));

        let update = SettingsUpdate::from_key_value("proxy", "socks5://127.0.0.1:1080").unwrap();
        assert_eq!(update.proxy.map(|p| p.port), Some(1080));
        assert!(SettingsUpdate::from_key_value("proxy", "127.0.0.1:1080").is_err());

        assert!(SettingsUpdate::from_key_value("proxy", "none").unwrap().clear_proxy);
        assert!(SettingsUpdate::from_key_value("request_timeout_secs", "soon").is_err());
        assert!(SettingsUpdate::from_key_value("theme", "dark").is_err());
    }
}
