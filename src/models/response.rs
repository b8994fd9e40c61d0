//! Response Types
//!
//! Standard response envelope returned by every command.

use serde::{Deserialize, Serialize};

use compscope_client::ErrorContext;

use crate::utils::error::AppError;

/// Generic command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Wrap a result, wording any error for the given action
    pub fn from_result(result: Result<T, AppError>, context: ErrorContext) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.user_message(context)),
        }
    }
}

impl<T> From<Result<T, AppError>> for CommandResponse<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub database: bool,
    pub config: bool,
    /// Whether a session token is available
    pub signed_in: bool,
    /// Whether the API answered; `None` when not probed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<bool>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: "compscope".to_string(),
            database: false,
            config: false,
            signed_in: false,
            api: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_response_ok() {
        let response = CommandResponse::ok("test".to_string());
        assert!(response.success);
        assert_eq!(response.data, Some("test".to_string()));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_command_response_err() {
        let response: CommandResponse<String> = CommandResponse::err("error message");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("error message".to_string()));
    }

    #[test]
    fn test_from_result_uses_context_wording() {
        let result: Result<(), AppError> =
            Err(compscope_client::ClientError::from_status(500, "").into());
        let response = CommandResponse::from_result(result, ErrorContext::Analysis);
        assert_eq!(
            response.error.as_deref(),
            Some("Failed to analyze property. Please try again.")
        );
    }

    #[test]
    fn test_health_response_default() {
        let health = HealthResponse::default();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "compscope");
        assert!(health.api.is_none());
    }
}
