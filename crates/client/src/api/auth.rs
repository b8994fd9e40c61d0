//! Authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result: the bearer token plus the raw response for the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub body: Value,
}

/// Find the bearer token in a login response.
///
/// The backend has returned it as `token`, `user.token` and
/// `user.accessToken` over time.
pub fn extract_token(body: &Value) -> Option<String> {
    [
        body.get("token"),
        body.get("accessToken"),
        body.pointer("/user/token"),
        body.pointer("/user/accessToken"),
        body.pointer("/data/token"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|t| !t.is_empty())
    .map(str::to_string)
}

impl ApiClient {
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let body: Value = self.post_json("/auth/login", request).await?;
        let token = extract_token(&body)
            .ok_or_else(|| ClientError::parse("login response did not include a token"))?;
        Ok(LoginResponse { token, body })
    }

    pub async fn my_profile(&self) -> ClientResult<Value> {
        self.get_json("/auth/myProfile").await
    }

    pub async fn logout(&self) -> ClientResult<Value> {
        self.get_json("/auth/logout").await
    }
}
