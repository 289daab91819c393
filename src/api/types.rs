use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::GatewayCore;
use crate::types::Environment;

/// API state shared between handlers
#[derive(Clone)]
pub struct ApiState {
    /// Gateway instance
    pub gateway: Arc<GatewayCore>,
    /// Deployment environment
    pub environment: Environment,
    /// Serve `/metrics`
    pub metrics_enabled: bool,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Success status
    pub success: bool,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Whether a credential is initialized
    pub credential_active: bool,
    /// Deployment environment
    pub environment: Environment,
}

/// Audit query parameters
#[derive(Debug, Default, Deserialize)]
pub struct AuditParams {
    /// Service identifier, e.g. `benefits_system`
    pub service: Option<String>,
    /// RFC 3339 lower bound
    pub since: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound
    pub until: Option<DateTime<Utc>>,
    /// Most recent N records
    pub limit: Option<usize>,
}

/// Public view of the active credential
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialResponse {
    /// Certificate ID
    pub certificate_id: String,
    /// Issuer
    pub issuer: String,
    /// End of validity
    pub valid_until: DateTime<Utc>,
    /// Seconds until expiry, zero once expired
    pub seconds_remaining: i64,
    /// Whether the credential has expired
    pub expired: bool,
}
