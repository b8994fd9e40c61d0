//! User administration endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;
use crate::error::ClientResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CreateUserRequest {
    /// Build a request from first and last name, as the admin form does.
    pub fn from_names(first: &str, last: &str, email: &str, password: &str) -> Self {
        Self {
            name: format!("{} {}", first.trim(), last.trim()).trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            role: None,
        }
    }
}

/// Partial user update; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

impl ApiClient {
    pub async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<Value> {
        self.post_json("/auth/create", request).await
    }

    pub async fn list_users(&self) -> ClientResult<Value> {
        self.get_json("/auth/users").await
    }

    pub async fn update_user(&self, user_id: &str, request: &UpdateUserRequest) -> ClientResult<Value> {
        self.put_json(&format!("/auth/users/{}", user_id), request)
            .await
    }

    pub async fn delete_user(&self, user_id: &str) -> ClientResult<Value> {
        self.delete_json(&format!("/auth/users/{}", user_id)).await
    }
}
