//! Per-service sliding-window rate limiter
//!
//! Each service owns its own window behind its own mutex, so services never
//! contend with each other. The set of services is fixed at construction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::RateLimit;
use crate::error::Error;
use crate::service::registry::ServiceRegistry;
use crate::types::{Result, ServiceIdentifier};

/// Sliding window for one service
struct ServiceWindow {
    limit: RateLimit,
    hits: Mutex<VecDeque<Instant>>,
}

/// In-memory sliding-window limiter
pub struct RateLimiter {
    windows: HashMap<ServiceIdentifier, ServiceWindow>,
}

impl RateLimiter {
    /// Create a limiter for the given budgets
    pub fn new(limits: impl IntoIterator<Item = (ServiceIdentifier, RateLimit)>) -> Self {
        let windows = limits
            .into_iter()
            .map(|(id, limit)| {
                (
                    id,
                    ServiceWindow {
                        limit,
                        hits: Mutex::new(VecDeque::new()),
                    },
                )
            })
            .collect();
        Self { windows }
    }

    /// Create a limiter covering every service in the registry
    pub fn from_registry(registry: &ServiceRegistry) -> Self {
        Self::new(registry.services().map(|s| (s.id, s.rate_limit)))
    }

    /// Consume one unit of budget for `service`
    pub fn try_acquire(&self, service: ServiceIdentifier) -> Result<()> {
        self.try_acquire_at(service, Instant::now())
    }

    /// Consume one unit of budget for `service` at `now`
    pub fn try_acquire_at(&self, service: ServiceIdentifier, now: Instant) -> Result<()> {
        let window = self.window(service)?;
        let span = Duration::from_secs(window.limit.window_seconds);
        let mut hits = window.hits.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= span {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= window.limit.requests as usize {
            warn!(
                service = %service,
                requests = window.limit.requests,
                window_seconds = window.limit.window_seconds,
                "Rate limit exceeded"
            );
            return Err(Error::RateLimitExceeded {
                service,
                requests: window.limit.requests,
                window_seconds: window.limit.window_seconds,
            });
        }

        hits.push_back(now);
        debug!(service = %service, used = hits.len(), "Rate limit budget consumed");
        Ok(())
    }

    /// Calls still available in the current window
    pub fn remaining(&self, service: ServiceIdentifier) -> Result<u32> {
        self.remaining_at(service, Instant::now())
    }

    /// Calls still available in the window ending at `now`
    pub fn remaining_at(&self, service: ServiceIdentifier, now: Instant) -> Result<u32> {
        let window = self.window(service)?;
        let span = Duration::from_secs(window.limit.window_seconds);
        let hits = window.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let used = hits
            .iter()
            .filter(|hit| now.saturating_duration_since(**hit) < span)
            .count() as u32;
        Ok(window.limit.requests.saturating_sub(used))
    }

    fn window(&self, service: ServiceIdentifier) -> Result<&ServiceWindow> {
        self.windows
            .get(&service)
            .ok_or_else(|| Error::Configuration(format!("No rate limit configured for {}", service)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn limiter(requests: u32, window_seconds: u64) -> RateLimiter {
        RateLimiter::new([
            (ServiceIdentifier::BenefitsSystem, RateLimit { requests, window_seconds }),
            (ServiceIdentifier::UtilityProvider, RateLimit { requests, window_seconds }),
        ])
    }

    #[test]
    fn test_budget_exhaustion() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        for i in 0..3 {
            assert!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, now + Duration::from_secs(i)).is_ok());
        }
        let result = limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, now + Duration::from_secs(3));
        assert!(matches!(result, Err(Error::RateLimitExceeded { requests: 3, window_seconds: 60, .. })));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 10);
        let start = Instant::now();

        limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start).unwrap();
        limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(5)).unwrap();
        assert!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(9)).is_err());

        // first hit leaves the window
        assert!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(10)).is_ok());
        assert_eq!(limiter.remaining_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(10)).unwrap(), 0);
    }

    #[test]
    fn test_rejected_call_does_not_consume_budget() {
        let limiter = limiter(1, 10);
        let start = Instant::now();

        limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start).unwrap();
        assert!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(1)).is_err());
        assert!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_services_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert_ok!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, now));
        assert_err!(limiter.try_acquire_at(ServiceIdentifier::BenefitsSystem, now));
        assert_ok!(limiter.try_acquire_at(ServiceIdentifier::UtilityProvider, now));
    }

    #[test]
    fn test_unknown_service_is_configuration_error() {
        let limiter = limiter(1, 60);
        assert!(matches!(
            limiter.try_acquire(ServiceIdentifier::IdentityRegistry),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquires_respect_budget() {
        let limiter = std::sync::Arc::new(limiter(5, 60));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_acquire(ServiceIdentifier::BenefitsSystem).is_ok() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, 5);
        assert_eq!(limiter.remaining(ServiceIdentifier::BenefitsSystem).unwrap(), 0);
        assert_eq!(limiter.remaining(ServiceIdentifier::UtilityProvider).unwrap(), 5);
    }
}
