pub mod cipher;
pub mod signer;

// Re-export key types
pub use cipher::{EncryptedEnvelope, PayloadCipher};
pub use signer::{request_target, verify_signature, RequestSignature, RequestSigner};
