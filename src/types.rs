use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::error::Error;

/// Project-wide Result type
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Downstream government data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceIdentifier {
    /// National identity registry
    IdentityRegistry,
    /// Benefits / welfare system
    BenefitsSystem,
    /// Law-enforcement records
    LawEnforcementRecords,
    /// Municipal services
    MunicipalServices,
    /// Utility provider
    UtilityProvider,
}

impl ServiceIdentifier {
    /// Every known service, in declaration order
    pub const ALL: [ServiceIdentifier; 5] = [
        ServiceIdentifier::IdentityRegistry,
        ServiceIdentifier::BenefitsSystem,
        ServiceIdentifier::LawEnforcementRecords,
        ServiceIdentifier::MunicipalServices,
        ServiceIdentifier::UtilityProvider,
    ];

    /// Stable snake_case tag used in config keys, metrics labels and audit records
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceIdentifier::IdentityRegistry => "identity_registry",
            ServiceIdentifier::BenefitsSystem => "benefits_system",
            ServiceIdentifier::LawEnforcementRecords => "law_enforcement_records",
            ServiceIdentifier::MunicipalServices => "municipal_services",
            ServiceIdentifier::UtilityProvider => "utility_provider",
        }
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ServiceIdentifier::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::Configuration(format!("Unknown service identifier: {}", s)))
    }
}

/// Data-sensitivity classification, ordered from least to most sensitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Public data
    Public,
    /// Internal data
    Internal,
    /// Confidential data
    Confidential,
    /// Restricted data
    Restricted,
}

impl Classification {
    /// All classifications in ascending order of sensitivity
    pub const ALL: [Classification; 4] = [
        Classification::Public,
        Classification::Internal,
        Classification::Confidential,
        Classification::Restricted,
    ];

    /// Lowercase tag, used for headers and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Public => "public",
            Classification::Internal => "internal",
            Classification::Confidential => "confidential",
            Classification::Restricted => "restricted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment used to select downstream base URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Production
    Production,
    /// Staging
    Staging,
    /// Development
    Development,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Staging => write!(f, "staging"),
            Environment::Development => write!(f, "development"),
        }
    }
}

/// Kind of access a call performs against the downstream resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read-only access
    Read,
    /// Mutating access
    Write,
}

impl Operation {
    /// Default operation implied by an HTTP method
    pub fn from_method(method: &http::Method) -> Self {
        if method == http::Method::GET || method == http::Method::HEAD {
            Operation::Read
        } else {
            Operation::Write
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
        }
    }
}
