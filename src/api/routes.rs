use axum::routing::get;
use axum::Router;
use once_cell::sync::Lazy;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    audit::query_audit, credential::get_credential, health::{health_check, STARTED_AT}, metrics::get_metrics,
};
use crate::api::types::ApiState;

/// API path prefix
pub const API_PREFIX: &str = "/api/v1";

/// Create router with all admin routes
pub fn create_router(state: ApiState) -> Router {
    Lazy::force(&STARTED_AT);

    let api_routes = Router::new()
        .route("/audit", get(query_audit))
        .route("/credential", get(get_credential));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .nest(API_PREFIX, api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
