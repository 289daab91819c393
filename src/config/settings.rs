use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::identity::{Credential, DEFAULT_TRUSTED_ISSUERS};
use crate::types::{Environment, Result, ServiceIdentifier};

/// Prefix for environment variable overrides (`GOVGATE__SECTION__KEY`)
pub const ENV_PREFIX: &str = "GOVGATE";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General configuration
    #[serde(default)]
    pub general: GeneralConfig,

    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Admin API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Outbound transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Trust roots
    #[serde(default)]
    pub trust: TrustConfig,

    /// Key store configuration
    #[serde(default)]
    pub keys: KeysConfig,

    /// Gateway credential, initialized at startup when present
    #[serde(default)]
    pub credential: Option<CredentialConfig>,

    /// Audit configuration
    #[serde(default)]
    pub audit: AuditConfig,

    /// Credential expiry monitor configuration
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Downstream services, one per identifier
    #[serde(default = "default_services")]
    pub services: HashMap<ServiceIdentifier, ServiceSettings>,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Application name
    pub app_name: String,

    /// Deployment environment, selects service base URLs
    pub environment: Environment,

    /// Log level
    pub log_level: String,

    /// Client version sent with every request
    pub client_version: String,

    /// Compliance tag sent with every request
    pub compliance_tag: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: "Secure Gov Gateway".to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            compliance_tag: "gov-data-protection-v1".to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Enable structured (JSON) logging
    pub structured_logging: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            structured_logging: true,
            enable_metrics: true,
        }
    }
}

/// Admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Serve the admin API
    pub enabled: bool,

    /// Listen address
    pub listen_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Outbound transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl TransportConfig {
    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Trust root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Issuers accepted for the gateway credential
    pub trusted_issuers: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trusted_issuers: DEFAULT_TRUSTED_ISSUERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Key store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Directory holding `<reference>.json` key files
    pub dir: PathBuf,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/keys"),
        }
    }
}

/// Gateway credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Certificate ID
    pub certificate_id: String,

    /// Base64 Ed25519 public key
    pub public_key: String,

    /// Key store reference for the private key
    pub private_key_ref: String,

    /// Issuing CA
    pub issuer: String,

    /// End of validity (RFC 3339)
    pub valid_until: DateTime<Utc>,
}

impl From<CredentialConfig> for Credential {
    fn from(config: CredentialConfig) -> Self {
        Credential {
            certificate_id: config.certificate_id,
            public_key: config.public_key,
            private_key_ref: config.private_key_ref,
            issuer: config.issuer,
            valid_until: config.valid_until,
        }
    }
}

/// Audit sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// In-memory, lost on restart
    Memory,
    /// Append-only JSON lines file
    Jsonl,
}

/// Audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Sink kind
    pub sink: AuditSinkKind,

    /// JSONL file path
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::Jsonl,
            path: PathBuf::from("./data/audit/audit.jsonl"),
        }
    }
}

/// Credential expiry monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Check interval in seconds
    pub expiry_check_seconds: u64,

    /// Warn when fewer days than this remain
    pub expiry_warning_days: i64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            expiry_check_seconds: 3600,
            expiry_warning_days: 14,
        }
    }
}

/// Request budget for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Calls allowed per window
    pub requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

/// Static configuration of one downstream service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Display name
    pub name: String,

    /// Calls above `Public` need an active credential
    pub requires_auth: bool,

    /// Request budget
    pub rate_limit: RateLimit,

    /// Base URL per environment
    pub base_urls: HashMap<Environment, String>,
}

impl ServiceSettings {
    fn with_host(name: &str, host: &str, requires_auth: bool, requests: u32) -> Self {
        let base_urls = [
            (Environment::Production, format!("https://{}.gov.example", host)),
            (Environment::Staging, format!("https://{}.staging.gov.example", host)),
            (Environment::Development, format!("http://localhost:9000/{}", host)),
        ]
        .into_iter()
        .collect();

        Self {
            name: name.to_string(),
            requires_auth,
            rate_limit: RateLimit {
                requests,
                window_seconds: 60,
            },
            base_urls,
        }
    }
}

/// Built-in service table
fn default_services() -> HashMap<ServiceIdentifier, ServiceSettings> {
    HashMap::from([
        (
            ServiceIdentifier::IdentityRegistry,
            ServiceSettings::with_host("National Identity Registry", "identity", true, 30),
        ),
        (
            ServiceIdentifier::BenefitsSystem,
            ServiceSettings::with_host("Benefits System", "benefits", true, 60),
        ),
        (
            ServiceIdentifier::LawEnforcementRecords,
            ServiceSettings::with_host("Law Enforcement Records", "police", true, 30),
        ),
        (
            ServiceIdentifier::MunicipalServices,
            ServiceSettings::with_host("Municipal Services", "municipal", false, 120),
        ),
        (
            ServiceIdentifier::UtilityProvider,
            ServiceSettings::with_host("Utility Provider", "utility", false, 120),
        ),
    ])
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            telemetry: TelemetryConfig::default(),
            api: ApiConfig::default(),
            transport: TransportConfig::default(),
            trust: TrustConfig::default(),
            keys: KeysConfig::default(),
            credential: None,
            audit: AuditConfig::default(),
            controller: ControllerConfig::default(),
            services: default_services(),
        }
    }
}

impl Settings {
    /// Load configuration from defaults, configuration files and environment variables
    pub fn load() -> Result<Self> {
        use config::{Config, Environment as EnvSource, File};
        use std::env;

        let mut builder = Config::builder();

        // Add default values
        builder = builder.add_source(Config::try_from(&Self::default())?);

        // Add configuration from files
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            debug!("Loading configuration from {}", config_path);
            builder = builder.add_source(File::with_name(&config_path));
        } else {
            builder = builder.add_source(File::with_name("config/default").required(false));

            let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
            builder = builder.add_source(File::with_name(&format!("config/{}", app_env)).required(false));
        }

        // Add environment variables
        builder = builder.add_source(EnvSource::with_prefix(ENV_PREFIX).separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML document, filling omitted sections with defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Check if configuration is valid
    pub fn validate(&self) -> Result<()> {
        if self.general.client_version.is_empty() {
            return Err(Error::Configuration("Client version cannot be empty".into()));
        }

        if self.general.compliance_tag.is_empty() {
            return Err(Error::Configuration("Compliance tag cannot be empty".into()));
        }

        if self.transport.timeout_seconds == 0 {
            return Err(Error::Configuration("Transport timeout cannot be zero".into()));
        }

        if self.trust.trusted_issuers.is_empty() {
            return Err(Error::Configuration("At least one trusted issuer is required".into()));
        }

        for id in ServiceIdentifier::ALL {
            let service = self
                .services
                .get(&id)
                .ok_or_else(|| Error::Configuration(format!("No configuration for service {}", id)))?;

            if service.rate_limit.requests == 0 || service.rate_limit.window_seconds == 0 {
                return Err(Error::Configuration(format!("Rate limit for {} must be non-zero", id)));
            }

            if !service.base_urls.contains_key(&self.general.environment) {
                return Err(Error::Configuration(format!(
                    "No {} base URL for service {}",
                    self.general.environment, id
                )));
            }
        }

        Ok(())
    }
}
