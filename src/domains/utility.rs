//! Utility provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayCore, GatewayRequest};
use crate::policy::EndpointDescriptor;
use crate::types::{Classification, Result, ServiceIdentifier};

/// Outage submission; household details are encrypted on an ordinary route
pub fn outage_report_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::UtilityProvider, "/outages", Classification::Internal)
        .encrypted()
        .government_data()
}

/// Outage report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageReport {
    /// electricity, water, gas...
    pub utility_type: String,
    /// Affected address
    pub address: String,
    /// Reporter's description
    pub description: String,
}

/// Ticket opened for an outage report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageTicket {
    /// Ticket reference
    pub ticket_reference: String,
    #[serde(default)]
    pub estimated_restoration: Option<DateTime<Utc>>,
}

/// Report an outage
pub async fn report_outage(gateway: &GatewayCore, report: &OutageReport) -> Result<OutageTicket> {
    let body = serde_json::to_value(report)?;
    gateway.call_typed(GatewayRequest::post(outage_report_endpoint(), body)).await
}
