use std::sync::{Arc, PoisonError, RwLock};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::crypto::{PayloadCipher, RequestSigner};
use crate::error::Error;
use crate::identity::keystore::KeyStore;
use crate::identity::types::Credential;
use crate::types::Result;

/// Credential together with the signer and cipher derived from it
#[derive(Debug)]
pub struct ActiveIdentity {
    credential: Credential,
    signer: RequestSigner,
    cipher: PayloadCipher,
}

impl ActiveIdentity {
    /// Public credential data
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Request signer
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Payload cipher
    pub fn cipher(&self) -> &PayloadCipher {
        &self.cipher
    }
}

/// Owns the single active identity of a gateway instance
///
/// Readers take an `Arc` snapshot; re-initialization swaps the pointer under
/// a short write lock, so in-flight calls keep a consistent identity.
pub struct CredentialManager {
    /// Issuers accepted at initialization
    trusted_issuers: Vec<String>,
    /// Private key resolution
    key_store: Arc<dyn KeyStore>,
    /// Current identity
    active: RwLock<Option<Arc<ActiveIdentity>>>,
}

impl CredentialManager {
    /// Create a manager with no active credential
    pub fn new(trusted_issuers: Vec<String>, key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            trusted_issuers,
            key_store,
            active: RwLock::new(None),
        }
    }

    /// Validate and activate a credential
    pub fn initialize(&self, credential: Credential) -> Result<()> {
        self.initialize_at(credential, Utc::now())
    }

    /// Validate and activate a credential as of `now`
    ///
    /// On any error the previously active credential is left untouched.
    pub fn initialize_at(&self, credential: Credential, now: DateTime<Utc>) -> Result<()> {
        if credential.is_expired_at(now) {
            warn!(certificate_id = %credential.certificate_id, "Rejected expired credential");
            return Err(Error::ExpiredCredential {
                certificate_id: credential.certificate_id,
                valid_until: credential.valid_until,
            });
        }

        if !self.trusted_issuers.iter().any(|issuer| issuer == &credential.issuer) {
            warn!(issuer = %credential.issuer, "Rejected credential from untrusted issuer");
            return Err(Error::UntrustedIssuer(credential.issuer));
        }

        let material = self.key_store.resolve(&credential.private_key_ref)?;
        let declared = BASE64
            .decode(credential.public_key.as_bytes())
            .map_err(|_| Error::InvalidCredential("Public key is not valid base64".to_string()))?;
        if declared.as_slice() != material.signing_key.verifying_key().as_bytes() {
            return Err(Error::InvalidCredential(
                "Public key does not match the referenced private key".to_string(),
            ));
        }

        let identity = Arc::new(ActiveIdentity {
            signer: RequestSigner::new(credential.certificate_id.clone(), material.signing_key),
            cipher: PayloadCipher::new(&material.payload_key),
            credential,
        });

        let previous = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(identity.clone());

        info!(
            certificate_id = %identity.credential.certificate_id,
            issuer = %identity.credential.issuer,
            valid_until = %identity.credential.valid_until,
            rotated = previous.is_some(),
            "Credential initialized"
        );
        Ok(())
    }

    /// Snapshot of the active identity
    pub fn active(&self) -> Option<Arc<ActiveIdentity>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether a credential has been initialized
    pub fn is_initialized(&self) -> bool {
        self.active.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Configured trust roots
    pub fn trusted_issuers(&self) -> &[String] {
        &self.trusted_issuers
    }
}
