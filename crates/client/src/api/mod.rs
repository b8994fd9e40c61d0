//! REST API Client
//!
//! Thin JSON helpers over the compscope backend, grouped by resource:
//!
//! - `property` - property search, address lookup and detail fetch
//! - `comps` - comparable discovery, analysis and MAO recalculation
//! - `auth` - login, profile and logout
//! - `users` - user administration

pub mod auth;
pub mod comps;
pub mod property;
pub mod users;

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub use auth::{extract_token, LoginRequest, LoginResponse};
pub use comps::{AnalyzeSelectedRequest, FindComparablesRequest};
pub use property::FetchDetailsRequest;
pub use users::{CreateUserRequest, UpdateUserRequest};

/// Default request timeout for non-streaming calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the compscope REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:4000/api`).
    pub fn new(base_url: &str, http: reqwest::Client) -> ClientResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::config(format!("invalid API base URL {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "unsupported API base URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            http,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for an API path such as `/comps/find/abc`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json::<(), T>(Method::GET, path, None).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json::<(), T>(Method::DELETE, path, None).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(method = %method, url = %url, "API request");

        let mut request = self
            .http
            .request(method, &url)
            .timeout(self.request_timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &text));
        }

        // Empty 2xx bodies decode as JSON null
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            ClientError::parse(format!("invalid response from {}: {}", url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let api = client("http://localhost:4000/api/");
        assert_eq!(api.base_url(), "http://localhost:4000/api");
        assert_eq!(api.endpoint("/comps/find/p1"), "http://localhost:4000/api/comps/find/p1");
        assert_eq!(api.endpoint("auth/login"), "http://localhost:4000/api/auth/login");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url", reqwest::Client::new()).is_err());
        assert!(ApiClient::new("ftp://files.local/api", reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let api = client("http://localhost:4000/api").with_token(Some(String::new()));
        assert!(api.token().is_none());
        let api = api.with_token(Some("abc".to_string()));
        assert_eq!(api.token(), Some("abc"));
    }
}
