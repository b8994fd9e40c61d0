//! User Administration Commands

use serde_json::Value;

use compscope_client::{CreateUserRequest, ErrorContext, UpdateUserRequest};

use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

fn require_id(user_id: &str) -> AppResult<&str> {
    let id = user_id.trim();
    if id.is_empty() {
        return Err(AppError::validation("User ID is required"));
    }
    Ok(id)
}

pub async fn list_users(state: &AppState) -> CommandResponse<Value> {
    let result = async {
        state.require_token()?;
        Ok::<_, AppError>(state.api_client().await?.list_users().await?)
    }
    .await;
    CommandResponse::from_result(result, ErrorContext::Users)
}

pub async fn create_user(state: &AppState, request: CreateUserRequest) -> CommandResponse<Value> {
    let result = async {
        if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::validation("Name, email and password are required"));
        }
        state.require_token()?;
        Ok::<_, AppError>(state.api_client().await?.create_user(&request).await?)
    }
    .await;
    if result.is_ok() {
        state.notifier().success("User created successfully!");
    }
    CommandResponse::from_result(result, ErrorContext::Users)
}

pub async fn update_user(
    state: &AppState,
    user_id: &str,
    request: UpdateUserRequest,
) -> CommandResponse<Value> {
    let result = async {
        let id = require_id(user_id)?;
        if request.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        state.require_token()?;
        Ok::<_, AppError>(state.api_client().await?.update_user(id, &request).await?)
    }
    .await;
    if result.is_ok() {
        state.notifier().success("User updated successfully!");
    }
    CommandResponse::from_result(result, ErrorContext::Users)
}

pub async fn delete_user(state: &AppState, user_id: &str) -> CommandResponse<Value> {
    let result = async {
        let id = require_id(user_id)?;
        state.require_token()?;
        Ok::<_, AppError>(state.api_client().await?.delete_user(id).await?)
    }
    .await;
    if result.is_ok() {
        state.notifier().success("User deleted successfully!");
    }
    CommandResponse::from_result(result, ErrorContext::Users)
}
