//! Classification-aware call pipeline

pub mod pipeline;
pub mod headers;
pub mod request;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::pipeline::{GatewayCore, GatewayOptions};
pub use self::request::GatewayRequest;
