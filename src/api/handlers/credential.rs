use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::types::{ApiResponse, ApiState, CredentialResponse};

/// `GET /api/v1/credential`; never exposes key material
pub async fn get_credential(State(state): State<ApiState>) -> ApiResult<Json<ApiResponse<CredentialResponse>>> {
    let identity = state
        .gateway
        .credentials()
        .active()
        .ok_or_else(|| ApiError::NotFound("no active credential".to_string()))?;

    let credential = identity.credential();
    let now = Utc::now();

    Ok(Json(ApiResponse::success(CredentialResponse {
        certificate_id: credential.certificate_id.clone(),
        issuer: credential.issuer.clone(),
        valid_until: credential.valid_until,
        seconds_remaining: credential.remaining_at(now).num_seconds(),
        expired: credential.is_expired_at(now),
    })))
}
