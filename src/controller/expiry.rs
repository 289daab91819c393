use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::identity::CredentialManager;
use crate::telemetry::GatewayMetrics;

/// Result of one expiry check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Nothing initialized
    NoCredential,
    /// Outside the warning window
    Healthy {
        /// Time left
        remaining: chrono::Duration,
    },
    /// Inside the warning window
    ExpiringSoon {
        /// Time left
        remaining: chrono::Duration,
    },
    /// Past `valid_until`
    Expired,
}

/// Credential expiry monitor
///
/// Only reports; re-initialization with a fresh credential is an explicit
/// operator action.
pub struct CredentialExpiryMonitor {
    /// Credential manager
    credentials: Arc<CredentialManager>,
    /// Metrics
    metrics: GatewayMetrics,
    /// Warning window
    warning_window: chrono::Duration,
    /// Whether it is running
    running: AtomicBool,
}

impl CredentialExpiryMonitor {
    /// Create a new monitor
    pub fn new(credentials: Arc<CredentialManager>, metrics: GatewayMetrics, warning_days: i64) -> Self {
        Self {
            credentials,
            metrics,
            warning_window: chrono::Duration::days(warning_days),
            running: AtomicBool::new(false),
        }
    }

    /// Check the active credential now
    pub fn check_once(&self) -> ExpiryStatus {
        self.check_at(Utc::now())
    }

    /// Check the active credential at `now`
    pub fn check_at(&self, now: DateTime<Utc>) -> ExpiryStatus {
        let Some(identity) = self.credentials.active() else {
            debug!("No active credential to check");
            self.metrics.set_credential_remaining(0.0);
            return ExpiryStatus::NoCredential;
        };

        let credential = identity.credential();
        let remaining = credential.remaining_at(now);
        self.metrics.set_credential_remaining(remaining.num_seconds() as f64);

        if credential.is_expired_at(now) {
            warn!(
                certificate_id = %credential.certificate_id,
                valid_until = %credential.valid_until,
                "Active credential has expired"
            );
            ExpiryStatus::Expired
        } else if remaining <= self.warning_window {
            warn!(
                certificate_id = %credential.certificate_id,
                days_remaining = remaining.num_days(),
                "Active credential expires soon"
            );
            ExpiryStatus::ExpiringSoon { remaining }
        } else {
            debug!(certificate_id = %credential.certificate_id, "Active credential is healthy");
            ExpiryStatus::Healthy { remaining }
        }
    }

    /// Start periodic checks; a second call returns `None`
    pub fn start(self: Arc<Self>, check_interval: Duration) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }

        info!("Starting credential expiry monitor every {:?}", check_interval);
        Some(tokio::spawn(async move {
            let mut interval = time::interval(check_interval);
            loop {
                interval.tick().await;
                self.check_once();
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::{credential_manager, valid_credential};

    #[test]
    fn test_no_credential() {
        let monitor = CredentialExpiryMonitor::new(credential_manager(), GatewayMetrics::new().unwrap(), 14);
        assert_eq!(monitor.check_once(), ExpiryStatus::NoCredential);
    }

    #[test]
    fn test_status_transitions() {
        let credentials = credential_manager();
        let credential = valid_credential();
        let valid_until = credential.valid_until;
        credentials.initialize(credential).unwrap();

        let monitor = CredentialExpiryMonitor::new(credentials, GatewayMetrics::new().unwrap(), 14);

        assert!(matches!(
            monitor.check_at(valid_until - chrono::Duration::days(30)),
            ExpiryStatus::Healthy { .. }
        ));
        assert!(matches!(
            monitor.check_at(valid_until - chrono::Duration::days(3)),
            ExpiryStatus::ExpiringSoon { .. }
        ));
        assert_eq!(monitor.check_at(valid_until + chrono::Duration::seconds(1)), ExpiryStatus::Expired);
    }

    #[tokio::test]
    async fn test_start_only_once() {
        let monitor = Arc::new(CredentialExpiryMonitor::new(
            credential_manager(),
            GatewayMetrics::new().unwrap(),
            14,
        ));

        let handle = monitor.clone().start(Duration::from_secs(3600)).unwrap();
        assert!(monitor.clone().start(Duration::from_secs(3600)).is_none());
        handle.abort();
    }
}
