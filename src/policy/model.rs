use serde::{Deserialize, Serialize};

use crate::policy::classification::{self, ClassificationPolicy};
use crate::types::{Classification, ServiceIdentifier};

/// Per-call-site description of a downstream endpoint
///
/// Declared flags can only tighten the classification policy: the effective
/// protection is the union of both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Target service
    pub service: ServiceIdentifier,
    /// Path relative to the service base URL
    pub path: String,
    /// Data sensitivity
    pub classification: Classification,
    /// Declared encryption requirement
    pub requires_encryption: bool,
    /// Declared secure-route requirement
    pub secure_route_required: bool,
    /// Resource rejects write operations
    pub read_only: bool,
    /// Carries government-sourced data
    pub contains_government_data: bool,
    /// Carries personally-identifying data
    pub contains_pii: bool,
}

/// Protection actually applied to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveProtection {
    /// Encrypt payloads
    pub encryption: bool,
    /// Use the secure route
    pub secure_route: bool,
    /// Resolved classification policy
    pub policy: ClassificationPolicy,
    /// Retention applied to audit records of this call
    pub retention_days: Option<u32>,
}

impl EndpointDescriptor {
    /// Create a descriptor with no declared extras
    pub fn new(service: ServiceIdentifier, path: impl Into<String>, classification: Classification) -> Self {
        Self {
            service,
            path: path.into(),
            classification,
            requires_encryption: false,
            secure_route_required: false,
            read_only: false,
            contains_government_data: false,
            contains_pii: false,
        }
    }

    /// Declare payload encryption
    pub fn encrypted(mut self) -> Self {
        self.requires_encryption = true;
        self
    }

    /// Declare the secure route
    pub fn secure_route(mut self) -> Self {
        self.secure_route_required = true;
        self
    }

    /// Mark the resource read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Mark as carrying government data
    pub fn government_data(mut self) -> Self {
        self.contains_government_data = true;
        self
    }

    /// Mark as carrying personally-identifying data
    pub fn personal_data(mut self) -> Self {
        self.contains_pii = true;
        self
    }

    /// Union of declared flags and the classification minimums
    pub fn effective(&self) -> EffectiveProtection {
        let policy = classification::resolve(self.classification);
        EffectiveProtection {
            encryption: self.requires_encryption || policy.mandatory_encryption,
            secure_route: self.secure_route_required || policy.mandatory_secure_route,
            policy,
            retention_days: classification::retention_days(
                self.classification,
                self.contains_government_data,
            ),
        }
    }
}

/// Sensitivity descriptor evaluated by the access validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDescriptor {
    /// Data sensitivity
    pub classification: Classification,
    /// Carries government-sourced data
    pub contains_government_data: bool,
    /// Carries personally-identifying data
    pub contains_pii: bool,
    /// Effective encryption requirement
    pub encryption_required: bool,
    /// Retention for records of this data
    pub retention_days: Option<u32>,
    /// Resource rejects write operations
    pub read_only: bool,
    /// Call cannot proceed without an active credential
    pub credential_required: bool,
}

impl DataDescriptor {
    /// Derive the descriptor for a call to `endpoint`
    ///
    /// `service_requires_auth` comes from the service registry and only
    /// applies above `Public`.
    pub fn for_endpoint(endpoint: &EndpointDescriptor, service_requires_auth: bool) -> Self {
        let effective = endpoint.effective();
        let credential_required = effective.encryption
            || endpoint.classification == Classification::Restricted
            || (service_requires_auth && endpoint.classification > Classification::Public);

        Self {
            classification: endpoint.classification,
            contains_government_data: endpoint.contains_government_data,
            contains_pii: endpoint.contains_pii,
            encryption_required: effective.encryption,
            retention_days: effective.retention_days,
            read_only: endpoint.read_only,
            credential_required,
        }
    }
}

/// Outcome of a zero-trust check, computed fresh for every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether the call may proceed
    pub allowed: bool,
    /// Reason for a denial
    pub reason: Option<String>,
}

impl AccessDecision {
    /// Allow the call
    pub fn allow() -> Self {
        Self { allowed: true, reason: None }
    }

    /// Deny the call with a human-readable reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
