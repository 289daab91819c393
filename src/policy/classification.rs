//! Classification policy resolver
//!
//! Maps a data-sensitivity classification to its caching, encryption,
//! routing and retention requirements. The table is fixed and must stay
//! stable across releases; downstream providers rely on it.

use std::time::Duration;

use serde::Serialize;

use crate::types::Classification;

/// Retention floor for any record sourced from a government provider (7 years)
pub const GOVERNMENT_RETENTION_DAYS: u32 = 2555;

/// Requirements derived from a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationPolicy {
    /// Response cache lifetime; zero disables caching
    pub cache_ttl_seconds: u64,
    /// Payloads must be encrypted
    pub mandatory_encryption: bool,
    /// Requests must use the secure route
    pub mandatory_secure_route: bool,
    /// Classification-specific retention, if any
    pub retention_days: Option<u32>,
}

impl ClassificationPolicy {
    /// Whether responses may be cached at all
    pub fn caching_allowed(&self) -> bool {
        self.cache_ttl_seconds > 0
    }

    /// Cache lifetime, `None` when caching is forbidden
    pub fn cache_ttl(&self) -> Option<Duration> {
        if self.caching_allowed() {
            Some(Duration::from_secs(self.cache_ttl_seconds))
        } else {
            None
        }
    }
}

/// Resolve the policy for a classification
pub fn resolve(classification: Classification) -> ClassificationPolicy {
    match classification {
        Classification::Public => ClassificationPolicy {
            cache_ttl_seconds: 3600,
            mandatory_encryption: false,
            mandatory_secure_route: false,
            retention_days: None,
        },
        Classification::Internal => ClassificationPolicy {
            cache_ttl_seconds: 1800,
            mandatory_encryption: false,
            mandatory_secure_route: false,
            retention_days: None,
        },
        Classification::Confidential => ClassificationPolicy {
            cache_ttl_seconds: 300,
            mandatory_encryption: true,
            mandatory_secure_route: true,
            retention_days: None,
        },
        Classification::Restricted => ClassificationPolicy {
            cache_ttl_seconds: 0,
            mandatory_encryption: true,
            mandatory_secure_route: true,
            retention_days: Some(GOVERNMENT_RETENTION_DAYS),
        },
    }
}

/// Retention for a record, applying the government-data floor
pub fn retention_days(classification: Classification, contains_government_data: bool) -> Option<u32> {
    let policy = resolve(classification).retention_days;
    if contains_government_data {
        Some(policy.map_or(GOVERNMENT_RETENTION_DAYS, |days| days.max(GOVERNMENT_RETENTION_DAYS)))
    } else {
        policy
    }
}
