use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::SigningKey;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::Error;
use crate::identity::types::KeyMaterial;
use crate::types::Result;

/// Resolves opaque private-key references to key material
pub trait KeyStore: Send + Sync {
    /// Resolve a reference
    fn resolve(&self, reference: &str) -> Result<KeyMaterial>;
}

/// In-memory key store
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<String, KeyMaterial>>,
}

impl InMemoryKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register key material under a reference
    pub fn insert(&self, reference: impl Into<String>, material: KeyMaterial) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.into(), material);
    }
}

impl KeyStore for InMemoryKeyStore {
    fn resolve(&self, reference: &str) -> Result<KeyMaterial> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::InvalidCredential(format!("Unknown key reference: {}", reference)))
    }
}

/// On-disk key file layout
#[derive(Deserialize)]
struct KeyFile {
    /// Base64 Ed25519 secret key (32 bytes)
    signing_key: String,
    /// Base64 payload key (32 bytes)
    payload_key: String,
}

/// Key store backed by `<dir>/<reference>.json` files
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// Create a store rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, reference: &str) -> Result<PathBuf> {
        let valid = !reference.is_empty()
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !reference.starts_with('.');
        if !valid {
            return Err(Error::InvalidCredential(format!("Invalid key reference: {}", reference)));
        }
        Ok(self.dir.join(format!("{}.json", reference)))
    }
}

impl KeyStore for FileKeyStore {
    fn resolve(&self, reference: &str) -> Result<KeyMaterial> {
        let path = self.key_path(reference)?;
        trace!("Reading key file: {}", path.display());

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::InvalidCredential(format!("Cannot read key for reference {}: {}", reference, e))
        })?;
        let file: KeyFile = serde_json::from_str(&content)
            .map_err(|e| Error::InvalidCredential(format!("Malformed key file: {}", e)))?;

        let material = KeyMaterial {
            signing_key: SigningKey::from_bytes(&decode_key(&file.signing_key, "signing_key")?),
            payload_key: decode_key(&file.payload_key, "payload_key")?,
        };
        debug!("Resolved key reference {}", reference);
        Ok(material)
    }
}

/// Decode a base64 32-byte key
fn decode_key(encoded: &str, field: &str) -> Result<[u8; 32]> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|_| Error::InvalidCredential(format!("{} is not valid base64", field)))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| Error::InvalidCredential(format!("{} must be 32 bytes", field)))
}
