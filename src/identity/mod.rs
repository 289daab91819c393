pub mod keystore;
pub mod manager;
pub mod types;

// Re-export key types
pub use keystore::{FileKeyStore, InMemoryKeyStore, KeyStore};
pub use manager::{ActiveIdentity, CredentialManager};
pub use types::{Credential, CredentialStatus, KeyMaterial, DEFAULT_TRUSTED_ISSUERS};
