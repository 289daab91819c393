pub mod rate_limiter;
pub mod registry;

pub use rate_limiter::RateLimiter;
pub use registry::{ServiceConfig, ServiceRegistry};
