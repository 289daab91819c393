use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Classification, ServiceIdentifier};

/// Terminal state of a call attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Call completed
    Success,
    /// Call failed after passing the policy gates
    Failure,
    /// Call rejected by the access validator or the rate limiter
    Denied,
    /// Caller abandoned the call
    Cancelled,
}

impl AuditOutcome {
    /// Lowercase tag used for metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::Denied => "denied",
            AuditOutcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one call attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record ID
    pub id: Uuid,
    /// Request ID, also sent downstream as `x-request-id`
    pub request_id: Uuid,
    /// Target service
    pub service: ServiceIdentifier,
    /// Endpoint path
    pub endpoint_path: String,
    /// HTTP method
    pub method: String,
    /// Data sensitivity of the call
    pub classification: Classification,
    /// Outcome
    pub outcome: AuditOutcome,
    /// Whether the call succeeded
    pub success: bool,
    /// Error description; never contains a downstream body
    pub error_message: Option<String>,
    /// Served from the response cache
    pub cache_hit: bool,
    /// Retention requirement for this record
    pub retention_days: Option<u32>,
    /// Time the record was written
    pub timestamp_utc: DateTime<Utc>,
}

/// Filter for audit queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Only records for this service
    pub service: Option<ServiceIdentifier>,
    /// Records at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Records before this instant
    pub until: Option<DateTime<Utc>>,
    /// Keep only the most recent `limit` matches
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Whether a record passes the service and time filters
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.service.map_or(true, |service| record.service == service)
            && self.since.map_or(true, |since| record.timestamp_utc >= since)
            && self.until.map_or(true, |until| record.timestamp_utc < until)
    }

    /// Filter records in append order and apply the limit
    pub fn apply<I>(&self, records: I) -> Vec<AuditRecord>
    where
        I: IntoIterator<Item = AuditRecord>,
    {
        let mut matched: Vec<AuditRecord> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(limit) = self.limit {
            if matched.len() > limit {
                matched.drain(..matched.len() - limit);
            }
        }
        matched
    }
}

#[cfg(test)]
pub(crate) fn sample_record(service: ServiceIdentifier, timestamp_utc: DateTime<Utc>) -> AuditRecord {
    AuditRecord {
        id: Uuid::new_v4(),
        request_id: Uuid::new_v4(),
        service,
        endpoint_path: "/statistics".into(),
        method: "GET".into(),
        classification: Classification::Internal,
        outcome: AuditOutcome::Success,
        success: true,
        error_message: None,
        cache_hit: false,
        retention_days: None,
        timestamp_utc,
    }
}
