use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::transport::types::{OutboundRequest, Transport, TransportError, TransportResponse};
use crate::types::Result;

/// `reqwest`-backed transport
///
/// Secure-route requests go through a separate client that refuses plain
/// HTTP and negotiates at least TLS 1.2.
pub struct ReqwestTransport {
    /// Client for normal-route requests
    client: reqwest::Client,
    /// Client for secure-route requests
    secure_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let secure_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .https_only(true)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build secure HTTP client: {}", e)))?;

        Ok(Self { client, secure_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> std::result::Result<TransportResponse, TransportError> {
        let client = if request.secure_route {
            &self.secure_client
        } else {
            &self.client
        };

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        debug!("Downstream responded with {} ({} bytes)", status, body.len());
        Ok(TransportResponse { status, body })
    }
}

/// Map a reqwest error without leaking the request URL (query strings may hold identifiers)
fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    let err = err.without_url();
    if err.is_connect() {
        warn!("Downstream connection failed: {}", err);
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
