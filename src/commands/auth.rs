//! Auth Commands
//!
//! Sign in, sign out and profile lookup. The token returned by login is kept
//! in the local cache and attached to every later request.

use serde_json::Value;
use tracing::{info, warn};

use compscope_client::{ErrorContext, LoginRequest};

use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

async fn login_inner(state: &AppState, email: &str, password: &str) -> AppResult<Value> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }
    let client = state.api_client().await?;
    let response = client
        .login(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })
        .await?;
    state.save_token(&response.token)?;
    info!(email = %email.trim(), "Signed in");
    Ok(response.body.get("user").cloned().unwrap_or(response.body))
}

/// Sign in and store the session token. Returns the user record.
pub async fn login(state: &AppState, email: &str, password: &str) -> CommandResponse<Value> {
    let result = login_inner(state, email, password).await;
    if result.is_ok() {
        state.notifier().success("Signed in");
    }
    CommandResponse::from_result(result, ErrorContext::Auth)
}

/// Sign out. The local token is dropped even when the server call fails.
pub async fn logout(state: &AppState) -> CommandResponse<bool> {
    let had_token = matches!(state.token(), Ok(Some(_)));
    if had_token {
        match state.api_client().await {
            Ok(client) => {
                if let Err(e) = client.logout().await {
                    warn!(error = %e, "Server logout failed; clearing local token anyway");
                }
            }
            Err(e) => warn!(error = %e, "Could not build API client for logout"),
        }
    }
    CommandResponse::from(state.clear_token().map(|_| had_token))
}

/// Profile of the signed-in user
pub async fn my_profile(state: &AppState) -> CommandResponse<Value> {
    let result = async {
        state.require_token()?;
        Ok::<_, AppError>(state.api_client().await?.my_profile().await?)
    }
    .await;
    CommandResponse::from_result(result, ErrorContext::Auth)
}
