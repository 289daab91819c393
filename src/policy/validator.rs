//! Zero-trust access validator
//!
//! First gate of every call. Pure with respect to I/O: it sees only the
//! data descriptor, the operation and the active credential.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::identity::Credential;
use crate::policy::model::{AccessDecision, DataDescriptor};
use crate::types::{Classification, Operation};

/// Allow/deny gate evaluated before any network I/O
#[derive(Debug, Clone, Default)]
pub struct ZeroTrustValidator;

impl ZeroTrustValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `operation` on data described by `descriptor` may proceed
    pub fn validate(
        &self,
        descriptor: &DataDescriptor,
        operation: Operation,
        credential: Option<&Credential>,
    ) -> AccessDecision {
        self.validate_at(descriptor, operation, credential, Utc::now())
    }

    /// Same as [`validate`](Self::validate) at a fixed instant
    pub fn validate_at(
        &self,
        descriptor: &DataDescriptor,
        operation: Operation,
        credential: Option<&Credential>,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        let credential_valid = credential.map_or(false, |c| !c.is_expired_at(now));

        let decision = if descriptor.classification == Classification::Restricted && !credential_valid {
            match credential {
                None => AccessDecision::deny("restricted data requires an active credential"),
                Some(_) => AccessDecision::deny("restricted data requires an unexpired credential"),
            }
        } else if operation == Operation::Write && descriptor.read_only {
            AccessDecision::deny("write operation on a read-only resource")
        } else if descriptor.credential_required && !credential_valid {
            if descriptor.encryption_required {
                AccessDecision::deny("payload encryption requires an active, unexpired credential")
            } else {
                AccessDecision::deny("service requires an active, unexpired credential")
            }
        } else {
            AccessDecision::allow()
        };

        if decision.allowed {
            debug!(
                classification = %descriptor.classification,
                operation = %operation,
                "Access allowed"
            );
        } else {
            warn!(
                classification = %descriptor.classification,
                operation = %operation,
                reason = decision.reason.as_deref().unwrap_or_default(),
                "Access denied"
            );
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn descriptor(classification: Classification) -> DataDescriptor {
        DataDescriptor {
            classification,
            contains_government_data: true,
            contains_pii: false,
            encryption_required: false,
            retention_days: Some(2555),
            read_only: false,
            credential_required: false,
        }
    }

    fn credential(valid_until: DateTime<Utc>) -> Credential {
        Credential {
            certificate_id: "cert-001".to_string(),
            public_key: String::new(),
            private_key_ref: "gateway".to_string(),
            issuer: "Government Root CA".to_string(),
            valid_until,
        }
    }

    #[test]
    fn test_restricted_without_credential_is_denied() {
        let validator = ZeroTrustValidator::new();
        let decision = validator.validate(&descriptor(Classification::Restricted), Operation::Read, None);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("restricted"));
    }

    #[test]
    fn test_restricted_with_expired_credential_is_denied() {
        let validator = ZeroTrustValidator::new();
        let now = Utc::now();
        let expired = credential(now - Duration::hours(1));
        let decision = validator.validate_at(&descriptor(Classification::Restricted), Operation::Read, Some(&expired), now);
        assert!(!decision.allowed);
    }

    #[test]
    fn test_restricted_with_valid_credential_is_allowed() {
        let validator = ZeroTrustValidator::new();
        let valid = credential(Utc::now() + Duration::days(30));
        let decision = validator.validate(&descriptor(Classification::Restricted), Operation::Read, Some(&valid));
        assert_eq!(decision, AccessDecision::allow());
    }

    #[test]
    fn test_write_to_read_only_is_denied() {
        let validator = ZeroTrustValidator::new();
        let mut data = descriptor(Classification::Public);
        data.read_only = true;

        assert!(validator.validate(&data, Operation::Read, None).allowed);
        let decision = validator.validate(&data, Operation::Write, None);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("read-only"));
    }

    #[test]
    fn test_encryption_requires_credential() {
        let validator = ZeroTrustValidator::new();
        let mut data = descriptor(Classification::Confidential);
        data.encryption_required = true;
        data.credential_required = true;

        assert!(!validator.validate(&data, Operation::Read, None).allowed);
        let valid = credential(Utc::now() + Duration::days(1));
        assert!(validator.validate(&data, Operation::Read, Some(&valid)).allowed);
    }

    #[test]
    fn test_public_without_credential_is_allowed() {
        let validator = ZeroTrustValidator::new();
        assert!(validator.validate(&descriptor(Classification::Public), Operation::Read, None).allowed);
    }
}
