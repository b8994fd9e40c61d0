//! Client Error Types
//!
//! Transport and HTTP-status errors for the compscope API. A non-2xx
//! response keeps its status and, when the body was JSON, the parsed body so
//! callers can surface the server's own `message`/`error` text.

use serde_json::Value;
use thiserror::Error;

use compscope_core::CoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// Connection, TLS or mid-stream socket failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid client configuration (base URL, proxy)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Which user action failed; selects the fallback wording of
/// [`ClientError::user_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Analysis,
    FindComparables,
    PropertySearch,
    AddressLookup,
    Recalculate,
    Auth,
    Users,
}

impl ErrorContext {
    fn not_found(self) -> &'static str {
        match self {
            ErrorContext::Analysis | ErrorContext::FindComparables => {
                "Property not found. Please try a different property."
            }
            ErrorContext::AddressLookup | ErrorContext::PropertySearch => {
                "Property not found for the given address."
            }
            ErrorContext::Recalculate => "Analysis not found.",
            ErrorContext::Auth | ErrorContext::Users => "User not found.",
        }
    }

    fn bad_request(self) -> &'static str {
        match self {
            ErrorContext::Analysis => "Invalid comp selection. Please select 3-5 comparables.",
            ErrorContext::FindComparables => "Failed to find comparables",
            ErrorContext::PropertySearch => "Invalid search filters.",
            ErrorContext::AddressLookup => "Invalid address.",
            ErrorContext::Recalculate => "Invalid MAO inputs.",
            ErrorContext::Auth => "Login failed.",
            ErrorContext::Users => "Invalid user details.",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            ErrorContext::Analysis => "Failed to analyze property. Please try again.",
            ErrorContext::FindComparables => "Failed to find comparables",
            ErrorContext::PropertySearch => "Failed to search properties. Please try again.",
            ErrorContext::AddressLookup => "Failed to search property. Please try again.",
            ErrorContext::Recalculate => "Failed to recalculate MAO. Please try again.",
            ErrorContext::Auth => "Login failed.",
            ErrorContext::Users => "Failed to update users. Please try again.",
        }
    }
}

impl ClientError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an HTTP error from a status code and the raw response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let json = serde_json::from_str::<Value>(body).ok();
        let message = json
            .as_ref()
            .and_then(server_text)
            .map(str::to_string)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && json.is_none()).then(|| trimmed.to_string())
            })
            .or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Request failed".to_string());

        Self::Http {
            status,
            message,
            body: json,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The `message` (or `error`) field of a JSON error body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { body: Some(body), .. } => server_text(body),
            _ => None,
        }
    }

    /// User-facing text for this error.
    pub fn user_message(&self, context: ErrorContext) -> String {
        match self.status() {
            Some(401) => "Unauthorized. Please sign in again.".to_string(),
            Some(404) if context != ErrorContext::AddressLookup => context.not_found().to_string(),
            Some(404) => self
                .server_message()
                .unwrap_or_else(|| context.not_found())
                .to_string(),
            Some(400) => self
                .server_message()
                .unwrap_or_else(|| context.bad_request())
                .to_string(),
            _ => self
                .server_message()
                .unwrap_or_else(|| context.fallback())
                .to_string(),
        }
    }
}

/// Non-empty `message`, falling back to `error`.
fn server_text(body: &Value) -> Option<&str> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<ClientError> for String {
    fn from(err: ClientError) -> String {
        err.to_string()
    }
}
