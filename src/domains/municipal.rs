//! Municipal services

use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayCore, GatewayRequest};
use crate::policy::EndpointDescriptor;
use crate::types::{Classification, Result, ServiceIdentifier};

pub fn service_request_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::MunicipalServices, "/service-requests", Classification::Internal)
        .government_data()
}

/// Citizen service request (potholes, waste collection...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub category: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestReceipt {
    /// Request reference
    pub reference: String,
    /// Initial status
    #[serde(default)]
    pub status: Option<String>,
}

/// Submit a service request
pub async fn submit_service_request(gateway: &GatewayCore, request: &ServiceRequest) -> Result<ServiceRequestReceipt> {
    let body = serde_json::to_value(request)?;
    gateway.call_typed(GatewayRequest::post(service_request_endpoint(), body)).await
}
