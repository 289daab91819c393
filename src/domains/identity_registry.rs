//! National identity registry

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::{GatewayCore, GatewayRequest};
use crate::policy::EndpointDescriptor;
use crate::types::{Classification, Operation, Result, ServiceIdentifier};

pub fn verify_identity_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::IdentityRegistry, "/identities/verify", Classification::Restricted)
        .encrypted()
        .secure_route()
        .government_data()
        .personal_data()
}

/// Identity fields returned by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityVerification {
    /// Identifier matched a registry entry
    pub verified: bool,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
}

/// Verify a national identity number
pub async fn verify_identity(gateway: &GatewayCore, national_id: &str) -> Result<IdentityVerification> {
    let request = GatewayRequest::post(verify_identity_endpoint(), json!({ "nationalId": national_id }))
        .with_operation(Operation::Read);
    gateway.call_typed(request).await
}
