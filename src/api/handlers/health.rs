use std::time::Instant;

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::api::types::{ApiResponse, ApiState, HealthResponse};

/// Process start, forced when the router is built
pub(crate) static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Health check handler
///
/// `GET /health`. Reports `degraded` when no credential is active, since
/// only Public endpoints can be served in that state.
pub async fn health_check(State(state): State<ApiState>) -> Json<ApiResponse<HealthResponse>> {
    debug!("Health check requested");

    let credential_active = state
        .gateway
        .credentials()
        .active()
        .map_or(false, |identity| !identity.credential().is_expired());

    Json(ApiResponse::success(HealthResponse {
        status: if credential_active { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: STARTED_AT.elapsed().as_secs(),
        credential_active,
        environment: state.environment,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::StatusCode;
    use serde_json::json;

    use crate::api::handlers::testing::{get, router};
    use crate::gateway::test_support::{fixture, initialized};
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_health_degraded_without_credential() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({})));
        let (status, body) = get(router(Arc::new(fx.gateway)), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "degraded");
        assert_eq!(body["data"]["credential_active"], false);
        assert_eq!(body["data"]["environment"], "development");
    }

    #[tokio::test]
    async fn test_health_ok_with_credential() {
        let fx = initialized(MockTransport::json(StatusCode::OK, json!({})));
        let (_, body) = get(router(Arc::new(fx.gateway)), "/health").await;
        assert_eq!(body["data"]["status"], "ok");
    }
}
