use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::TelemetryConfig;
use crate::error::Error;
use crate::types::Result;

/// Tracing target for operational events that must reach operators
/// even when the originating call has already returned
pub const OPS_TARGET: &str = "gov_gateway::ops";

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` directives take precedence over the configured level.
pub fn init_logging(telemetry: &TelemetryConfig, log_level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(log_level).into())
        .from_env_lossy();

    let registry = Registry::default().with(filter);

    let result = if telemetry.structured_logging {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    };

    result.map_err(|e| Error::Internal(format!("Failed to set global default subscriber: {}", e)))
}
