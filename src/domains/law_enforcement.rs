//! Law-enforcement records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayCore, GatewayRequest};
use crate::policy::EndpointDescriptor;
use crate::types::{Classification, Result, ServiceIdentifier};

pub fn incident_report_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::LawEnforcementRecords, "/incidents", Classification::Confidential)
        .encrypted()
        .secure_route()
        .government_data()
        .personal_data()
}

pub fn crime_statistics_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::LawEnforcementRecords, "/statistics", Classification::Internal)
        .read_only()
        .government_data()
}

/// Citizen incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    /// Incident category
    pub category: String,
    /// Free-text description
    pub description: String,
    /// Where it happened
    pub location: String,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
    /// Reporter contact, if given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Acknowledgement of a submitted report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReceipt {
    /// Case reference
    pub case_reference: String,
}

/// Aggregated statistics for an area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeStatistics {
    /// Counts per category
    pub stats: BTreeMap<String, u64>,
    /// Area safety rating
    pub safety_rating: String,
}

/// Submit an incident report
pub async fn submit_incident_report(gateway: &GatewayCore, report: &IncidentReport) -> Result<IncidentReceipt> {
    let body = serde_json::to_value(report)?;
    gateway.call_typed(GatewayRequest::post(incident_report_endpoint(), body)).await
}

/// Crime statistics for an area
pub async fn crime_statistics(gateway: &GatewayCore, area: &str) -> Result<CrimeStatistics> {
    let request = GatewayRequest::get(crime_statistics_endpoint()).with_param("area", area);
    gateway.call_typed(request).await
}
