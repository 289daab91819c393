use std::collections::BTreeMap;

use http::Method;
use serde_json::Value;

use crate::policy::EndpointDescriptor;
use crate::types::Operation;

/// One call through the gateway
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Target endpoint and its sensitivity
    pub endpoint: EndpointDescriptor,
    /// HTTP method
    pub method: Method,
    /// Access kind checked by the validator
    pub operation: Operation,
    /// Query parameters
    pub params: BTreeMap<String, String>,
    /// JSON body, encrypted on the wire when policy requires it
    pub body: Option<Value>,
}

impl GatewayRequest {
    /// Create a request; the operation follows the method
    pub fn new(endpoint: EndpointDescriptor, method: Method) -> Self {
        let operation = Operation::from_method(&method);
        Self {
            endpoint,
            method,
            operation,
            params: BTreeMap::new(),
            body: None,
        }
    }

    /// `GET` read
    pub fn get(endpoint: EndpointDescriptor) -> Self {
        Self::new(endpoint, Method::GET)
    }

    /// `POST` with a JSON body
    pub fn post(endpoint: EndpointDescriptor, body: Value) -> Self {
        Self::new(endpoint, Method::POST).with_body(body)
    }

    /// Override the operation, e.g. for a lookup sent as `POST`
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Add a query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, ServiceIdentifier};

    #[test]
    fn test_post_defaults_to_write() {
        let endpoint = EndpointDescriptor::new(ServiceIdentifier::UtilityProvider, "/outages", Classification::Internal);
        let request = GatewayRequest::post(endpoint.clone(), Value::Null);
        assert_eq!(request.operation, Operation::Write);

        let lookup = GatewayRequest::post(endpoint, Value::Null).with_operation(Operation::Read);
        assert_eq!(lookup.operation, Operation::Read);
        assert_eq!(lookup.method, Method::POST);
    }
}
