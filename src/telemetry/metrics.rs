use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::error::Error;
use crate::types::{Result, ServiceIdentifier};

/// Gateway metrics, held in a private registry
#[derive(Clone)]
pub struct GatewayMetrics {
    /// Registry
    registry: Registry,
    /// Calls by service and outcome
    calls_total: IntCounterVec,
    /// Cache hits by service
    cache_hits_total: IntCounterVec,
    /// Call latency by service
    call_duration_seconds: HistogramVec,
    /// Audit sink failures
    audit_write_failures_total: IntCounter,
    /// Seconds until the active credential expires
    credential_seconds_remaining: Gauge,
}

impl GatewayMetrics {
    /// Create and register all gateway metrics
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let calls_total = IntCounterVec::new(
            Opts::new("gateway_calls_total", "Gateway calls by service and outcome"),
            &["service", "outcome"],
        )?;
        registry.register(Box::new(calls_total.clone()))?;

        let cache_hits_total = IntCounterVec::new(
            Opts::new("gateway_cache_hits_total", "Responses served from the cache"),
            &["service"],
        )?;
        registry.register(Box::new(cache_hits_total.clone()))?;

        let call_duration_seconds = HistogramVec::new(
            HistogramOpts::new("gateway_call_duration_seconds", "Gateway call latency"),
            &["service"],
        )?;
        registry.register(Box::new(call_duration_seconds.clone()))?;

        let audit_write_failures_total = IntCounter::new(
            "gateway_audit_write_failures_total",
            "Audit records the sink failed to persist",
        )?;
        registry.register(Box::new(audit_write_failures_total.clone()))?;

        let credential_seconds_remaining = Gauge::new(
            "gateway_credential_seconds_remaining",
            "Seconds until the active credential expires",
        )?;
        registry.register(Box::new(credential_seconds_remaining.clone()))?;

        Ok(Self {
            registry,
            calls_total,
            cache_hits_total,
            call_duration_seconds,
            audit_write_failures_total,
            credential_seconds_remaining,
        })
    }

    /// Count a finished call
    pub fn observe_call(&self, service: ServiceIdentifier, outcome: &str, seconds: f64) {
        self.calls_total.with_label_values(&[service.as_str(), outcome]).inc();
        self.call_duration_seconds
            .with_label_values(&[service.as_str()])
            .observe(seconds);
    }

    /// Count a cache hit
    pub fn inc_cache_hit(&self, service: ServiceIdentifier) {
        self.cache_hits_total.with_label_values(&[service.as_str()]).inc();
    }

    /// Count an audit sink failure
    pub fn inc_audit_failure(&self) {
        self.audit_write_failures_total.inc();
    }

    /// Audit sink failures so far
    pub fn audit_failures(&self) -> u64 {
        self.audit_write_failures_total.get()
    }

    /// Calls so far for a service and outcome
    pub fn calls(&self, service: ServiceIdentifier, outcome: &str) -> u64 {
        self.calls_total.with_label_values(&[service.as_str(), outcome]).get()
    }

    /// Record time left on the active credential
    pub fn set_credential_remaining(&self, seconds: f64) {
        self.credential_seconds_remaining.set(seconds);
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(format!("Metrics are not UTF-8: {}", e)))
    }
}
