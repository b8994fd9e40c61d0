//! HTTP Client Factory
//!
//! Builds the shared `reqwest::Client` used for both JSON calls and the
//! analysis event stream.

use std::time::Duration;

use compscope_core::proxy::ProxyConfig;

use crate::error::{ClientError, ClientResult};

/// Connection-level settings for the shared client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub proxy: Option<ProxyConfig>,
    /// Paired with the proxy's username for basic auth
    pub proxy_password: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            proxy_password: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Build a `reqwest::Client` with a cookie store and the resolved proxy.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
///
/// No overall timeout is set on the client: an analysis stream may stay open
/// for minutes. JSON calls set a per-request timeout instead.
pub fn build_http_client(settings: &HttpSettings) -> ClientResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .cookie_store(true)
        .connect_timeout(settings.connect_timeout);

    match &settings.proxy {
        Some(cfg) => {
            let url = cfg.url();
            let mut proxy = reqwest::Proxy::all(&url)
                .map_err(|e| ClientError::config(format!("invalid proxy URL {}: {}", url, e)))?;
            if let (Some(user), Some(password)) = (&cfg.username, &settings.proxy_password) {
                proxy = proxy.basic_auth(user, password);
            }
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }

    builder
        .build()
        .map_err(|e| ClientError::config(format!("failed to build HTTP client: {}", e)))
}
