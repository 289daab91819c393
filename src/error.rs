use std::fmt;
use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::transport::TransportError;
use crate::types::ServiceIdentifier;

/// Generic error type
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown service, missing policy mapping or invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credential validity window has passed
    #[error("Credential {certificate_id} expired at {valid_until}")]
    ExpiredCredential {
        /// Certificate ID of the rejected credential
        certificate_id: String,
        /// End of the validity window
        valid_until: DateTime<Utc>,
    },

    /// Credential issuer is not a trusted root
    #[error("Untrusted credential issuer: {0}")]
    UntrustedIssuer(String),

    /// Credential key material could not be resolved or does not match
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Rejected by the zero-trust access validator
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Per-service request budget exhausted
    #[error("Rate limit exceeded for {service}: {requests} requests per {window_seconds}s")]
    RateLimitExceeded {
        /// Target service
        service: ServiceIdentifier,
        /// Allowed requests per window
        requests: u32,
        /// Window size in seconds
        window_seconds: u64,
    },

    /// Payload encryption failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Payload decryption or authentication failed
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Request signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Network, timeout or non-success status from the transport
    #[error("Downstream call to {service} failed: {source}")]
    Downstream {
        /// Target service
        service: ServiceIdentifier,
        /// Underlying transport error
        #[source]
        source: TransportError,
    },

    /// Downstream body could not be decoded
    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse {
        /// Target service
        service: ServiceIdentifier,
        /// Decoding failure, never the body itself
        reason: String,
    },

    /// Audit log failed its integrity check
    #[error("Audit log integrity violated: {0}")]
    AuditIntegrity(String),

    /// Call was cancelled by its owner
    #[error("Call cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Non-sensitive error category surfaced to callers and UIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Access denied by policy
    AccessDenied,
    /// Rate limited
    RateLimited,
    /// Downstream unavailable or misbehaving
    ServiceUnavailable,
    /// Credential, signing or payload protection failure
    SecurityFailure,
    /// Gateway misconfiguration
    Configuration,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// Fixed message that is safe to show to end users
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::AccessDenied => "access denied",
            ErrorCategory::RateLimited => "rate limited",
            ErrorCategory::ServiceUnavailable => "service unavailable",
            ErrorCategory::SecurityFailure => "secure processing failed",
            ErrorCategory::Configuration => "gateway misconfigured",
            ErrorCategory::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl Error {
    /// Category of this error for user-facing reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::AccessDenied(_) => ErrorCategory::AccessDenied,
            Error::RateLimitExceeded { .. } => ErrorCategory::RateLimited,
            Error::Downstream { .. } | Error::InvalidResponse { .. } | Error::Cancelled => {
                ErrorCategory::ServiceUnavailable
            }
            Error::ExpiredCredential { .. }
            | Error::UntrustedIssuer(_)
            | Error::InvalidCredential(_)
            | Error::Encryption(_)
            | Error::Decryption(_)
            | Error::Signing(_)
            | Error::AuditIntegrity(_) => ErrorCategory::SecurityFailure,
            Error::Configuration(_) => ErrorCategory::Configuration,
            Error::Io(_) | Error::Serialization(_) | Error::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Configuration(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Internal(format!("Metrics error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downstream_error_is_service_unavailable() {
        let err = Error::Downstream {
            service: ServiceIdentifier::BenefitsSystem,
            source: TransportError::Status(503),
        };
        assert_eq!(err.category(), ErrorCategory::ServiceUnavailable);
        assert_eq!(err.category().user_message(), "service unavailable");
    }

    #[test]
    fn test_security_errors_share_category() {
        assert_eq!(Error::Decryption("tag".into()).category(), ErrorCategory::SecurityFailure);
        assert_eq!(Error::UntrustedIssuer("x".into()).category(), ErrorCategory::SecurityFailure);
        assert_eq!(Error::AccessDenied("no".into()).category(), ErrorCategory::AccessDenied);
    }
}
