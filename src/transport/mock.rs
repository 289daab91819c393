use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use tracing::debug;

use crate::transport::types::{OutboundRequest, Transport, TransportError, TransportResponse};

type Handler =
    dyn Fn(&OutboundRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Scripted in-process transport
///
/// Records every request it receives, which makes it usable both for tests
/// and for running the gateway without live downstream services.
pub struct MockTransport {
    /// Response producer
    handler: Box<Handler>,
    /// Artificial latency applied after the request is recorded
    delay: Option<Duration>,
    /// Requests received so far
    requests: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    /// Create a mock transport driven by a handler
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&OutboundRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the given JSON body
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self::new(move |_| Ok(TransportResponse::json(status, &body)))
    }

    /// Always fail with the given transport error
    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Delay every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Snapshot of received requests
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        debug!("Mock transport received {} {}", request.method, request.url.path());
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.handler)(&request)
    }
}
