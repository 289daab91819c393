pub mod expiry;

pub use expiry::{CredentialExpiryMonitor, ExpiryStatus};
