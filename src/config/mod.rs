//! Gateway configuration
//!
//! Layering: built-in defaults, then `config/default.yaml` and
//! `config/{APP_ENV}.yaml` (or `CONFIG_FILE`), then `GOVGATE__*` variables.

pub mod settings;

pub use settings::{
    ApiConfig, AuditConfig, AuditSinkKind, ControllerConfig, CredentialConfig, GeneralConfig,
    KeysConfig, RateLimit, ServiceSettings, Settings, TelemetryConfig, TransportConfig,
    TrustConfig, ENV_PREFIX,
};
