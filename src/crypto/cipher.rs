//! Authenticated payload encryption (ChaCha20-Poly1305)
//!
//! Sealed layout: 12-byte random nonce followed by ciphertext and tag.
//! Decryption fails closed: any tampering, truncation or key mismatch is an
//! error and no plaintext is returned.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Result;

/// Nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes
pub const TAG_LEN: usize = 16;

/// Algorithm marker sent with encrypted payloads
pub const ALGORITHM: &str = "chacha20poly1305";

/// JSON wire envelope for encrypted bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Base64 of nonce || ciphertext || tag
    pub ciphertext: String,
}

/// Symmetric payload cipher
pub struct PayloadCipher {
    cipher: ChaCha20Poly1305,
}

impl fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadCipher { .. }")
    }
}

impl PayloadCipher {
    /// Create a cipher from a 256-bit key
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Encrypt and authenticate a payload
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| Error::Encryption("Payload encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Authenticate and decrypt a sealed payload
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::Decryption("Sealed payload too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Decryption("Payload authentication failed".to_string()))
    }

    /// Encrypt a payload into a serialized JSON envelope
    pub fn seal_envelope(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let envelope = EncryptedEnvelope {
            ciphertext: BASE64.encode(self.encrypt(plaintext)?),
        };
        serde_json::to_vec(&envelope)
            .map_err(|e| Error::Encryption(format!("Failed to encode envelope: {}", e)))
    }

    /// Decrypt a serialized JSON envelope
    pub fn open_envelope(&self, body: &[u8]) -> Result<Vec<u8>> {
        let envelope: EncryptedEnvelope = serde_json::from_slice(body)
            .map_err(|_| Error::Decryption("Response is not an encrypted envelope".to_string()))?;
        let sealed = BASE64
            .decode(envelope.ciphertext.as_bytes())
            .map_err(|_| Error::Decryption("Envelope ciphertext is not valid base64".to_string()))?;
        self.decrypt(&sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = PayloadCipher::new(&[1u8; 32]);
        let sealed = cipher.encrypt(b"beneficiary record").unwrap();

        assert_ne!(&sealed[NONCE_LEN..], b"beneficiary record");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), b"beneficiary record");
    }

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let cipher = PayloadCipher::new(&[1u8; 32]);
        let sealed = cipher.encrypt(b"identity fields").unwrap();

        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert!(matches!(cipher.decrypt(&tampered), Err(Error::Decryption(_))), "byte {}", i);
        }
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let sealed = PayloadCipher::new(&[1u8; 32]).encrypt(b"payload").unwrap();
        let other = PayloadCipher::new(&[2u8; 32]);
        assert!(matches!(other.decrypt(&sealed), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_truncated_payload_fails_closed() {
        let cipher = PayloadCipher::new(&[1u8; 32]);
        assert!(matches!(cipher.decrypt(&[0u8; 10]), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_envelope() {
        let cipher = PayloadCipher::new(&[3u8; 32]);
        let body = cipher.seal_envelope(b"{\"ok\":true}").unwrap();
        assert_eq!(cipher.open_envelope(&body).unwrap(), b"{\"ok\":true}");
        assert!(matches!(cipher.open_envelope(b"{\"ok\":true}"), Err(Error::Decryption(_))));
    }
}
