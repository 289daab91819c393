//! Request signing with the active credential
//!
//! Signed material: certificate id, method, request target (path and query),
//! unix timestamp, a random nonce and the SHA-256 of the plaintext payload,
//! newline separated.
//! Receivers are expected to reject stale timestamps and repeated nonces.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::types::Result;

/// Signature attached to an outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature {
    /// Certificate that produced the signature
    pub certificate_id: String,
    /// Unix timestamp (seconds) included in the signed material
    pub timestamp: i64,
    /// Random per-request nonce included in the signed material
    pub nonce: String,
    /// Base64-encoded Ed25519 signature
    pub signature: String,
}

/// Ed25519 request signer bound to one certificate
pub struct RequestSigner {
    /// Certificate ID of the active credential
    certificate_id: String,
    /// Private key resolved from the key store
    signing_key: SigningKey,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("certificate_id", &self.certificate_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer
    pub fn new(certificate_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            certificate_id: certificate_id.into(),
            signing_key,
        }
    }

    /// Certificate ID used in signed material and headers
    pub fn certificate_id(&self) -> &str {
        &self.certificate_id
    }

    /// Public half of the signing key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a payload with the current time and a fresh nonce
    pub fn sign(&self, method: &str, target: &str, payload: &[u8]) -> RequestSignature {
        self.sign_with(method, target, payload, Utc::now().timestamp(), Uuid::new_v4().to_string())
    }

    /// Sign a payload with an explicit timestamp and nonce
    pub fn sign_with(
        &self,
        method: &str,
        target: &str,
        payload: &[u8],
        timestamp: i64,
        nonce: String,
    ) -> RequestSignature {
        let material = canonical_material(&self.certificate_id, method, target, timestamp, &nonce, payload);
        let signature = self.signing_key.sign(&material);

        RequestSignature {
            certificate_id: self.certificate_id.clone(),
            timestamp,
            nonce,
            signature: BASE64.encode(signature.to_bytes()),
        }
    }
}

/// Path plus `?query` of a URL, as covered by the signature
pub fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Build the canonical bytes covered by a request signature
pub fn canonical_material(
    certificate_id: &str,
    method: &str,
    target: &str,
    timestamp: i64,
    nonce: &str,
    payload: &[u8],
) -> Vec<u8> {
    let payload_hash = Sha256::digest(payload);
    format!(
        "{}\n{}\n{}\n{}\n{}\n{:x}",
        certificate_id, method, target, timestamp, nonce, payload_hash
    )
    .into_bytes()
}

/// Verify a request signature against a public key
pub fn verify_signature(
    verifying_key: &VerifyingKey,
    method: &str,
    target: &str,
    payload: &[u8],
    signature: &RequestSignature,
) -> Result<()> {
    let bytes = BASE64
        .decode(&signature.signature)
        .map_err(|e| Error::Signing(format!("Invalid signature encoding: {}", e)))?;
    let signature_value = Signature::from_slice(&bytes)
        .map_err(|e| Error::Signing(format!("Invalid signature length: {}", e)))?;

    let material = canonical_material(
        &signature.certificate_id,
        method,
        target,
        signature.timestamp,
        &signature.nonce,
        payload,
    );

    verifying_key
        .verify(&material, &signature_value)
        .map_err(|_| Error::Signing("Signature verification failed".to_string()))
}
