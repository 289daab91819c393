use std::fmt;

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// Issuers accepted when no trust list is configured
pub const DEFAULT_TRUSTED_ISSUERS: &[&str] = &[
    "Government Root CA",
    "National PKI Root CA G2",
    "Government Services Intermediate CA",
];

/// Certificate-backed gateway identity
///
/// Holds only a reference to the private key, never the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Certificate identifier sent with every signed request
    pub certificate_id: String,
    /// Base64-encoded Ed25519 public key
    pub public_key: String,
    /// Opaque key-store handle for the private key
    pub private_key_ref: String,
    /// Issuing certificate authority
    pub issuer: String,
    /// End of the validity window
    pub valid_until: DateTime<Utc>,
}

/// Identity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
    /// Valid
    Valid,
    /// Expired
    Expired,
}

impl Credential {
    /// Whether the credential has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Whether the credential has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Status at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> CredentialStatus {
        if self.is_expired_at(now) {
            CredentialStatus::Expired
        } else {
            CredentialStatus::Valid
        }
    }

    /// Time left in the validity window, zero once expired
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.valid_until - now).max(Duration::zero())
    }
}

/// Key material resolved from a key store
#[derive(Clone)]
pub struct KeyMaterial {
    /// Request signing key
    pub signing_key: SigningKey,
    /// Payload encryption key
    pub payload_key: [u8; 32],
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial { .. }")
    }
}
