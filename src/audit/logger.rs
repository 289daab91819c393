use std::sync::Arc;

use tracing::{debug, error};

use crate::audit::record::{AuditQuery, AuditRecord};
use crate::audit::sink::AuditSink;
use crate::telemetry::{GatewayMetrics, OPS_TARGET};
use crate::types::Result;

/// Front end for the audit sink
///
/// Recording never fails: a sink error is reported on the ops tracing target
/// and counted, and the caller's result is returned unchanged.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    metrics: GatewayMetrics,
}

impl AuditLogger {
    /// Create a logger over `sink`
    pub fn new(sink: Arc<dyn AuditSink>, metrics: GatewayMetrics) -> Self {
        Self { sink, metrics }
    }

    /// Append a record
    pub async fn record(&self, record: AuditRecord) {
        match self.sink.append(&record).await {
            Ok(()) => debug!(
                request_id = %record.request_id,
                service = %record.service,
                outcome = %record.outcome,
                "Audit record written"
            ),
            Err(e) => {
                self.metrics.inc_audit_failure();
                error!(
                    target: OPS_TARGET,
                    request_id = %record.request_id,
                    service = %record.service,
                    outcome = %record.outcome,
                    error = %e,
                    "Failed to write audit record"
                );
            }
        }
    }

    /// Query stored records
    pub async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>> {
        self.sink.query(query).await
    }
}
