use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use url::Url;

/// Fully prepared request handed to the transport
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: Method,
    /// Resolved URL (service base URL + path + query)
    pub url: Url,
    /// Headers, including compliance and signature headers
    pub headers: HeaderMap,
    /// Body bytes, already encrypted when policy requires it
    pub body: Option<Bytes>,
    /// Whether the request must travel over the secure route
    pub secure_route: bool,
}

/// Raw downstream response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status code
    pub status: StatusCode,
    /// Body bytes
    pub body: Bytes,
}

impl TransportResponse {
    /// Build a response with a JSON body
    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
        }
    }
}

/// Transport-level failure
///
/// Variants never carry downstream response bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Could not reach the downstream service
    #[error("connection failed: {0}")]
    Connect(String),

    /// Non-success status code
    #[error("unexpected status {0}")]
    Status(u16),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),
}

/// Generic HTTP transport consumed by the gateway
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}
