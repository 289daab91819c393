use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::types::ApiState;

/// `GET /metrics` in Prometheus text format
pub async fn get_metrics(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    if !state.metrics_enabled {
        return Err(ApiError::NotFound("metrics are disabled".to_string()));
    }

    let body = state.gateway.metrics().render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
