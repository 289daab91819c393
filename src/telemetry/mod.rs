pub mod logging;
pub mod metrics;

pub use logging::{init_logging, OPS_TARGET};
pub use metrics::GatewayMetrics;
