use std::collections::HashMap;

use tracing::{debug, info};
use url::Url;

use crate::config::{RateLimit, ServiceSettings};
use crate::error::Error;
use crate::types::{Environment, Result, ServiceIdentifier};

/// Resolved configuration of one downstream service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service identifier
    pub id: ServiceIdentifier,
    /// Display name
    pub name: String,
    /// Base URL for the active environment
    pub base_url: Url,
    /// Calls above `Public` need an active credential
    pub requires_auth: bool,
    /// Request budget
    pub rate_limit: RateLimit,
}

impl ServiceConfig {
    /// Absolute URL for `path` under this service
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| Error::Configuration(format!("Invalid endpoint URL for {}: {}", self.id, e)))
    }
}

/// Static service table, resolved once for one environment
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    /// Environment the base URLs were selected for
    environment: Environment,
    /// Resolved services
    services: HashMap<ServiceIdentifier, ServiceConfig>,
}

impl ServiceRegistry {
    /// Build a registry from already-resolved entries
    pub fn new(environment: Environment, services: impl IntoIterator<Item = ServiceConfig>) -> Self {
        Self {
            environment,
            services: services.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    /// Resolve base URLs for `environment` from settings
    pub fn from_settings(
        settings: &HashMap<ServiceIdentifier, ServiceSettings>,
        environment: Environment,
    ) -> Result<Self> {
        let mut services = HashMap::with_capacity(settings.len());

        for (id, service) in settings {
            let raw = service.base_urls.get(&environment).ok_or_else(|| {
                Error::Configuration(format!("No {} base URL for service {}", environment, id))
            })?;
            let base_url = Url::parse(raw)
                .map_err(|e| Error::Configuration(format!("Invalid base URL for {}: {}", id, e)))?;

            debug!("Service {} resolved to {}", id, base_url);
            services.insert(
                *id,
                ServiceConfig {
                    id: *id,
                    name: service.name.clone(),
                    base_url,
                    requires_auth: service.requires_auth,
                    rate_limit: service.rate_limit,
                },
            );
        }

        info!("Service registry loaded {} services for {}", services.len(), environment);
        Ok(Self { environment, services })
    }

    /// Look up a service; a miss is a configuration error
    pub fn resolve(&self, id: ServiceIdentifier) -> Result<&ServiceConfig> {
        self.services
            .get(&id)
            .ok_or_else(|| Error::Configuration(format!("Service {} is not configured", id)))
    }

    /// All configured services
    pub fn services(&self) -> impl Iterator<Item = &ServiceConfig> {
        self.services.values()
    }

    /// Environment of this registry
    pub fn environment(&self) -> Environment {
        self.environment
    }
}
