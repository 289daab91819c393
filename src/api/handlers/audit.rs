use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::types::{ApiResponse, ApiState, AuditParams};
use crate::audit::{AuditQuery, AuditRecord};
use crate::types::ServiceIdentifier;

/// `GET /api/v1/audit?service=&since=&until=&limit=`
pub async fn query_audit(
    State(state): State<ApiState>,
    Query(params): Query<AuditParams>,
) -> ApiResult<Json<ApiResponse<Vec<AuditRecord>>>> {
    let service = params
        .service
        .as_deref()
        .map(str::parse::<ServiceIdentifier>)
        .transpose()
        .map_err(|_| ApiError::BadRequest("unknown service".to_string()))?;

    let query = AuditQuery {
        service,
        since: params.since,
        until: params.until,
        limit: params.limit,
    };

    let records = state.gateway.audit().query(&query).await?;
    Ok(Json(ApiResponse::success(records)))
}
