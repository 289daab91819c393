//! Outbound header contract

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use uuid::Uuid;

use crate::crypto::cipher::ALGORITHM;
use crate::crypto::RequestSignature;
use crate::error::Error;
use crate::types::{Classification, Result};

pub const API_MARKER: &str = "x-gov-api";
pub const API_MARKER_VALUE: &str = "1";
pub const CLIENT_VERSION: &str = "x-client-version";
pub const COMPLIANCE_TAG: &str = "x-compliance-tag";
pub const DATA_CLASSIFICATION: &str = "x-data-classification";
pub const REQUEST_ID: &str = "x-request-id";
pub const CERTIFICATE_ID: &str = "x-certificate-id";
pub const SIGNATURE: &str = "x-signature";
pub const SIGNATURE_TIMESTAMP: &str = "x-signature-timestamp";
pub const SIGNATURE_NONCE: &str = "x-signature-nonce";
pub const SECURE_ROUTE: &str = "x-secure-route";
pub const SECURE_ROUTE_VALUE: &str = "required";
pub const PAYLOAD_ENCODING: &str = "x-payload-encoding";

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Configuration(format!("Invalid value for header {}", name)))
}

/// Builds the header set of one outbound request
pub struct HeaderBuilder {
    headers: HeaderMap,
}

impl HeaderBuilder {
    /// Headers present on every call
    pub fn compliance(
        client_version: &str,
        compliance_tag: &str,
        classification: Classification,
        request_id: Uuid,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_MARKER), HeaderValue::from_static(API_MARKER_VALUE));
        headers.insert(HeaderName::from_static(CLIENT_VERSION), header_value(CLIENT_VERSION, client_version)?);
        headers.insert(HeaderName::from_static(COMPLIANCE_TAG), header_value(COMPLIANCE_TAG, compliance_tag)?);
        headers.insert(
            HeaderName::from_static(DATA_CLASSIFICATION),
            HeaderValue::from_static(classification.as_str()),
        );
        headers.insert(
            HeaderName::from_static(REQUEST_ID),
            header_value(REQUEST_ID, &request_id.to_string())?,
        );
        Ok(Self { headers })
    }

    /// Attach the credential signature
    pub fn signature(mut self, signature: &RequestSignature) -> Result<Self> {
        self.headers.insert(
            HeaderName::from_static(CERTIFICATE_ID),
            header_value(CERTIFICATE_ID, &signature.certificate_id)?,
        );
        self.headers.insert(HeaderName::from_static(SIGNATURE), header_value(SIGNATURE, &signature.signature)?);
        self.headers.insert(
            HeaderName::from_static(SIGNATURE_TIMESTAMP),
            HeaderValue::from(signature.timestamp),
        );
        self.headers.insert(
            HeaderName::from_static(SIGNATURE_NONCE),
            header_value(SIGNATURE_NONCE, &signature.nonce)?,
        );
        Ok(self)
    }

    /// Mark the request for the secure route
    pub fn secure_route(mut self) -> Self {
        self.headers.insert(HeaderName::from_static(SECURE_ROUTE), HeaderValue::from_static(SECURE_ROUTE_VALUE));
        self
    }

    /// Mark the body as an encrypted envelope
    pub fn encrypted(mut self) -> Self {
        self.headers.insert(HeaderName::from_static(PAYLOAD_ENCODING), HeaderValue::from_static(ALGORITHM));
        self
    }

    /// Declare a JSON body
    pub fn json_body(mut self) -> Self {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Finish
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

/// Read a request signature back from headers
pub fn signature_from_headers(headers: &HeaderMap) -> Option<RequestSignature> {
    let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

    Some(RequestSignature {
        certificate_id: text(CERTIFICATE_ID)?,
        timestamp: text(SIGNATURE_TIMESTAMP)?.parse().ok()?,
        nonce: text(SIGNATURE_NONCE)?,
        signature: text(SIGNATURE)?,
    })
}
