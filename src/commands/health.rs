//! Health Check Commands
//!
//! Commands for checking the health status of local storage and the API.

use std::time::Duration;

use tracing::debug;

use crate::models::response::{CommandResponse, HealthResponse};
use crate::state::AppState;

const API_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Get the health status of all services. With `probe_api` the API base URL
/// is requested once; any HTTP answer counts as reachable.
pub async fn get_health(state: &AppState, probe_api: bool) -> CommandResponse<HealthResponse> {
    let mut health = HealthResponse::default();

    health.database = state.is_database_healthy();
    health.config = state.is_config_healthy();
    health.signed_in = matches!(state.token(), Ok(Some(_)));

    if probe_api {
        health.api = Some(match state.api_client().await {
            Ok(client) => {
                let reachable = client
                    .http()
                    .get(client.base_url())
                    .timeout(API_PROBE_TIMEOUT)
                    .send()
                    .await
                    .is_ok();
                debug!(url = client.base_url(), reachable, "API probe");
                reachable
            }
            Err(_) => false,
        });
    }

    let healthy = health.database && health.config && health.api.unwrap_or(true);
    health.status = if healthy { "healthy" } else { "degraded" }.to_string();

    CommandResponse::ok(health)
}
