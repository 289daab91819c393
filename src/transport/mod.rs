//! Outbound transport to downstream government services

pub mod types;
pub mod client;
pub mod mock;

pub use self::types::{OutboundRequest, Transport, TransportError, TransportResponse};
pub use self::client::ReqwestTransport;
pub use self::mock::MockTransport;
