//! Gateway call pipeline
//!
//! Resolve, Validate, RateCheck, PrepareHeaders, Encrypt, Dispatch, Decrypt,
//! CacheStore, then exactly one audit record. Stages run strictly in order and
//! the first failure ends the call. There is no retry inside the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditOutcome, AuditRecord};
use crate::cache::{CacheKey, ResponseCache};
use crate::config::Settings;
use crate::crypto::request_target;
use crate::error::Error;
use crate::gateway::headers::HeaderBuilder;
use crate::gateway::request::GatewayRequest;
use crate::identity::{ActiveIdentity, Credential, CredentialManager};
use crate::policy::{DataDescriptor, ZeroTrustValidator};
use crate::service::{RateLimiter, ServiceRegistry};
use crate::telemetry::{GatewayMetrics, OPS_TARGET};
use crate::transport::{OutboundRequest, Transport, TransportError};
use crate::types::{Classification, Result, ServiceIdentifier};

/// Per-instance gateway options
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Sent as `x-client-version`
    pub client_version: String,
    /// Sent as `x-compliance-tag`
    pub compliance_tag: String,
    /// Upper bound on one downstream call
    pub timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            compliance_tag: "gov-data-protection-v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayOptions {
    /// Options from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            client_version: settings.general.client_version.clone(),
            compliance_tag: settings.general.compliance_tag.clone(),
            timeout: settings.transport.timeout(),
        }
    }
}

/// Failed stage result: the audit outcome and the error returned to the caller
type StageError = (AuditOutcome, Error);

/// Fields shared by every audit record of one call
#[derive(Clone)]
struct CallContext {
    request_id: Uuid,
    service: ServiceIdentifier,
    endpoint_path: String,
    method: Method,
    classification: Classification,
    retention_days: Option<u32>,
}

impl CallContext {
    fn record(&self, outcome: AuditOutcome, error: Option<&Error>, cache_hit: bool) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            request_id: self.request_id,
            service: self.service,
            endpoint_path: self.endpoint_path.clone(),
            method: self.method.to_string(),
            classification: self.classification,
            outcome,
            success: outcome == AuditOutcome::Success,
            error_message: error.map(|e| e.to_string()),
            cache_hit,
            retention_days: self.retention_days,
            timestamp_utc: Utc::now(),
        }
    }
}

/// Writes a `Cancelled` record if the call future is dropped before its
/// audit record was written
struct AuditGuard {
    armed: Option<(AuditLogger, GatewayMetrics, CallContext, Instant)>,
}

impl AuditGuard {
    fn new(audit: AuditLogger, metrics: GatewayMetrics, context: CallContext) -> Self {
        Self {
            armed: Some((audit, metrics, context, Instant::now())),
        }
    }

    fn disarm(&mut self) {
        self.armed = None;
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        let Some((audit, metrics, context, started)) = self.armed.take() else {
            return;
        };

        let error = Error::Cancelled;
        let record = context.record(AuditOutcome::Cancelled, Some(&error), false);
        metrics.observe_call(context.service, AuditOutcome::Cancelled.as_str(), started.elapsed().as_secs_f64());
        warn!(request_id = %context.request_id, service = %context.service, "Gateway call cancelled");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { audit.record(record).await });
            }
            Err(_) => error!(
                target: OPS_TARGET,
                request_id = %context.request_id,
                service = %context.service,
                "No runtime to write cancellation audit record"
            ),
        }
    }
}

/// Classification-aware gateway to downstream government services
pub struct GatewayCore {
    registry: ServiceRegistry,
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialManager>,
    validator: ZeroTrustValidator,
    rate_limiter: RateLimiter,
    cache: ResponseCache,
    audit: AuditLogger,
    metrics: GatewayMetrics,
    options: GatewayOptions,
}

impl GatewayCore {
    /// Create a gateway; the rate limiter covers every registry entry
    pub fn new(
        registry: ServiceRegistry,
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialManager>,
        validator: ZeroTrustValidator,
        audit: AuditLogger,
        metrics: GatewayMetrics,
        options: GatewayOptions,
    ) -> Self {
        let rate_limiter = RateLimiter::from_registry(&registry);
        Self {
            registry,
            transport,
            credentials,
            validator,
            rate_limiter,
            cache: ResponseCache::new(),
            audit,
            metrics,
            options,
        }
    }

    /// Validate and activate the gateway credential
    pub fn initialize(&self, credential: Credential) -> Result<()> {
        self.credentials.initialize(credential)
    }

    /// Credential manager
    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Service registry
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Metrics
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Response cache
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Run a call and return the decrypted JSON response
    pub async fn call(&self, request: GatewayRequest) -> Result<Value> {
        self.call_typed(request).await
    }

    /// Run a call and decode the response into `T`
    ///
    /// A response that does not match `T` fails the call and is audited as a
    /// failure.
    pub async fn call_typed<T: DeserializeOwned>(&self, request: GatewayRequest) -> Result<T> {
        let effective = request.endpoint.effective();
        let context = CallContext {
            request_id: Uuid::new_v4(),
            service: request.endpoint.service,
            endpoint_path: request.endpoint.path.clone(),
            method: request.method.clone(),
            classification: request.endpoint.classification,
            retention_days: effective.retention_days,
        };

        let span = info_span!(
            "gateway_call",
            request_id = %context.request_id,
            service = %context.service,
            endpoint = %context.endpoint_path,
            method = %context.method,
        );

        let mut guard = AuditGuard::new(self.audit.clone(), self.metrics.clone(), context.clone());

        async move {
            let started = Instant::now();

            let result = self.run(&request, context.request_id).await.and_then(|(value, cache_hit)| {
                serde_json::from_value::<T>(value)
                    .map(|typed| (typed, cache_hit))
                    .map_err(|_| {
                        (
                            AuditOutcome::Failure,
                            Error::InvalidResponse {
                                service: context.service,
                                reason: "response does not match the expected shape".to_string(),
                            },
                        )
                    })
            });

            let (record, result) = match result {
                Ok((value, cache_hit)) => {
                    info!(cache_hit, "Gateway call succeeded");
                    (context.record(AuditOutcome::Success, None, cache_hit), Ok(value))
                }
                Err((outcome, error)) => {
                    warn!(%outcome, category = %error.category(), error = %error, "Gateway call failed");
                    (context.record(outcome, Some(&error), false), Err(error))
                }
            };

            self.metrics
                .observe_call(context.service, record.outcome.as_str(), started.elapsed().as_secs_f64());
            self.audit.record(record).await;
            guard.disarm();

            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &GatewayRequest, request_id: Uuid) -> std::result::Result<(Value, bool), StageError> {
        let endpoint = &request.endpoint;
        let effective = endpoint.effective();
        let failure = |e: Error| (AuditOutcome::Failure, e);

        // Resolve
        let service = self.registry.resolve(endpoint.service).map_err(failure)?;

        // Validate
        let identity = self.credentials.active();
        let descriptor = DataDescriptor::for_endpoint(endpoint, service.requires_auth);
        let decision = self.validator.validate(
            &descriptor,
            request.operation,
            identity.as_ref().map(|i| i.credential()),
        );
        if !decision.allowed {
            let reason = decision.reason.unwrap_or_else(|| "access denied".to_string());
            return Err((AuditOutcome::Denied, Error::AccessDenied(reason)));
        }

        // RateCheck
        self.rate_limiter
            .try_acquire(service.id)
            .map_err(|e| (AuditOutcome::Denied, e))?;

        // Cache is consulted for reads only; a hit skips every network stage
        let cache_key = CacheKey::new(service.id, endpoint.path.clone(), request.method.clone(), &request.params);
        let cache_ttl = if ResponseCache::is_cacheable(&request.method, endpoint.classification) {
            effective.policy.cache_ttl()
        } else {
            None
        };
        if cache_ttl.is_some() {
            if let Some(value) = self.cache.get(&cache_key) {
                debug!("Serving response from cache");
                self.metrics.inc_cache_hit(service.id);
                return Ok((value, true));
            }
        }

        // PrepareHeaders
        let mut url = service.endpoint_url(&endpoint.path).map_err(failure)?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }

        let plaintext = match &request.body {
            Some(body) => serde_json::to_vec(body).map_err(|e| failure(e.into()))?,
            None => Vec::new(),
        };

        let signer_identity: Option<&Arc<ActiveIdentity>> =
            identity.as_ref().filter(|i| !i.credential().is_expired());

        let mut headers = HeaderBuilder::compliance(
            &self.options.client_version,
            &self.options.compliance_tag,
            endpoint.classification,
            request_id,
        )
        .map_err(failure)?;

        match signer_identity {
            Some(identity) => {
                let signature = identity.signer().sign(request.method.as_str(), &request_target(&url), &plaintext);
                headers = headers.signature(&signature).map_err(failure)?;
            }
            None if identity.is_some() => warn!("Active credential has expired; request left unsigned"),
            None => debug!("No active credential; request left unsigned"),
        }

        if effective.secure_route {
            headers = headers.secure_route();
        }

        // Encrypt
        let body = if effective.encryption {
            let identity = signer_identity
                .ok_or_else(|| failure(Error::Encryption("No active credential for payload encryption".to_string())))?;
            headers = headers.encrypted().json_body();
            Some(Bytes::from(identity.cipher().seal_envelope(&plaintext).map_err(failure)?))
        } else if request.body.is_some() {
            headers = headers.json_body();
            Some(Bytes::from(plaintext))
        } else {
            None
        };

        // Dispatch
        let outbound = OutboundRequest {
            method: request.method.clone(),
            url,
            headers: headers.build(),
            body,
            secure_route: effective.secure_route,
        };

        let downstream = |source: TransportError| {
            failure(Error::Downstream {
                service: service.id,
                source,
            })
        };

        let response = match tokio::time::timeout(self.options.timeout, self.transport.send(outbound)).await {
            Err(_) => return Err(downstream(TransportError::Timeout)),
            Ok(Err(e)) => return Err(downstream(e)),
            Ok(Ok(response)) => response,
        };

        if !response.status.is_success() {
            return Err(downstream(TransportError::Status(response.status.as_u16())));
        }

        // Decrypt
        let body = if effective.encryption {
            let identity = signer_identity
                .ok_or_else(|| failure(Error::Decryption("No active credential for payload decryption".to_string())))?;
            identity.cipher().open_envelope(&response.body).map_err(failure)?
        } else {
            response.body.to_vec()
        };

        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).map_err(|_| {
                failure(Error::InvalidResponse {
                    service: service.id,
                    reason: "response body is not valid JSON".to_string(),
                })
            })?
        };

        // CacheStore
        if let Some(ttl) = cache_ttl {
            self.cache.insert(cache_key, value.clone(), ttl);
        }

        Ok((value, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::sink::MockAuditSink;
    use crate::crypto::{verify_signature, PayloadCipher};
    use crate::gateway::headers::{self, signature_from_headers};
    use crate::gateway::test_support::*;
    use crate::policy::EndpointDescriptor;
    use crate::service::ServiceConfig;
    use crate::transport::{MockTransport, TransportResponse};
    use crate::types::{Environment, Operation};
    use http::StatusCode;
    use serde_json::json;

    fn public_schedules() -> EndpointDescriptor {
        EndpointDescriptor::new(ServiceIdentifier::BenefitsSystem, "/payment-schedules", Classification::Public)
    }

    fn restricted_identity() -> EndpointDescriptor {
        EndpointDescriptor::new(ServiceIdentifier::IdentityRegistry, "/identities/verify", Classification::Restricted)
            .encrypted()
            .secure_route()
    }

    #[tokio::test]
    async fn test_public_lookup_without_credential() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({"schedules": []})));

        let value = fx.gateway.call(GatewayRequest::get(public_schedules())).await.unwrap();
        assert_eq!(value, json!({"schedules": []}));

        let sent = fx.transport.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].headers.get(headers::CERTIFICATE_ID).is_none());
        assert!(!sent[0].secure_route);
        assert_eq!(fx.audit.records()[0].outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn test_repeated_public_lookup_hits_cache() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({"schedules": [1]})));

        let first = fx.gateway.call(GatewayRequest::get(public_schedules())).await.unwrap();
        let second = fx.gateway.call(GatewayRequest::get(public_schedules())).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.transport.call_count(), 1);

        let records = fx.audit.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].cache_hit);
        assert!(records[1].cache_hit);
        assert_eq!(fx.gateway.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_different_params_miss_cache() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({})));

        fx.gateway.call(GatewayRequest::get(public_schedules()).with_param("month", "1")).await.unwrap();
        fx.gateway.call(GatewayRequest::get(public_schedules()).with_param("month", "2")).await.unwrap();

        assert_eq!(fx.transport.call_count(), 2);
        assert_eq!(fx.transport.requests()[1].url.query(), Some("month=2"));
    }

    #[tokio::test]
    async fn test_separator_in_param_value_misses_cache() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({})));

        fx.gateway
            .call(GatewayRequest::get(public_schedules()).with_param("month", "2026-11&program=pension"))
            .await
            .unwrap();
        fx.gateway
            .call(
                GatewayRequest::get(public_schedules())
                    .with_param("month", "2026-11")
                    .with_param("program", "pension"),
            )
            .await
            .unwrap();

        assert_eq!(fx.transport.call_count(), 2);
        assert_eq!(fx.gateway.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_signature_covers_query_parameters() {
        let fx = initialized(MockTransport::json(StatusCode::OK, json!({"incidents": 3})));
        let endpoint =
            EndpointDescriptor::new(ServiceIdentifier::LawEnforcementRecords, "/statistics", Classification::Internal);

        fx.gateway
            .call(GatewayRequest::get(endpoint).with_param("area", "north"))
            .await
            .unwrap();

        let sent = &fx.transport.requests()[0];
        let signature = signature_from_headers(&sent.headers).unwrap();
        let verifying_key = fx.credentials.active().unwrap().signer().verifying_key();
        let target = request_target(&sent.url);
        assert!(target.ends_with("/statistics?area=north"));

        verify_signature(&verifying_key, "GET", &target, b"", &signature).unwrap();
        let altered = target.replace("area=north", "area=south");
        assert!(verify_signature(&verifying_key, "GET", &altered, b"", &signature).is_err());
    }

    #[tokio::test]
    async fn test_restricted_without_credential_is_denied_before_io() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({})));

        let request = GatewayRequest::post(restricted_identity(), json!({"nationalId": "X1"}))
            .with_operation(Operation::Read);
        let result = fx.gateway.call(request).await;

        assert!(matches!(result, Err(Error::AccessDenied(_))));
        assert_eq!(fx.transport.call_count(), 0);
        assert!(fx.gateway.cache().is_empty());

        let records = fx.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AuditOutcome::Denied);
        assert_eq!(records[0].classification, Classification::Restricted);

        // denial consumed no rate budget
        let remaining = fx.gateway.rate_limiter.remaining(ServiceIdentifier::IdentityRegistry).unwrap();
        assert_eq!(remaining, 30);
    }

    #[tokio::test]
    async fn test_write_to_read_only_resource_is_denied() {
        let fx = initialized(MockTransport::json(StatusCode::OK, json!({})));
        let endpoint = EndpointDescriptor::new(
            ServiceIdentifier::LawEnforcementRecords,
            "/statistics",
            Classification::Internal,
        )
        .read_only();

        let result = fx.gateway.call(GatewayRequest::post(endpoint, json!({}))).await;
        match result {
            Err(Error::AccessDenied(reason)) => assert!(reason.contains("read-only")),
            other => panic!("expected denial, got {:?}", other),
        }
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_before_io() {
        let registry = ServiceRegistry::new(
            Environment::Development,
            vec![ServiceConfig {
                id: ServiceIdentifier::MunicipalServices,
                name: "Municipal Services".into(),
                base_url: "http://localhost:9000/municipal".parse().unwrap(),
                requires_auth: false,
                rate_limit: crate::config::RateLimit {
                    requests: 2,
                    window_seconds: 60,
                },
            }],
        );
        let fx = fixture_with(
            MockTransport::json(StatusCode::OK, json!({"reference": "R-1"})),
            registry,
            GatewayOptions::default(),
        );
        let endpoint = EndpointDescriptor::new(ServiceIdentifier::MunicipalServices, "/requests", Classification::Internal);

        for _ in 0..2 {
            fx.gateway.call(GatewayRequest::post(endpoint.clone(), json!({}))).await.unwrap();
        }
        let result = fx.gateway.call(GatewayRequest::post(endpoint, json!({}))).await;

        assert!(matches!(result, Err(Error::RateLimitExceeded { requests: 2, .. })));
        assert_eq!(fx.transport.call_count(), 2);

        let records = fx.audit.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].outcome, AuditOutcome::Denied);
        assert!(!records[2].success);
    }

    #[tokio::test]
    async fn test_missing_service_config_fails_fast() {
        let fx = fixture_with(
            MockTransport::json(StatusCode::OK, json!({})),
            ServiceRegistry::new(Environment::Development, Vec::new()),
            GatewayOptions::default(),
        );

        let result = fx.gateway.call(GatewayRequest::get(public_schedules())).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(fx.transport.call_count(), 0);
        assert_eq!(fx.audit.records()[0].outcome, AuditOutcome::Failure);
    }

    #[tokio::test]
    async fn test_signed_encrypted_request() {
        let fx = initialized(encrypted_responder(|request| {
            json!({"echo": request["nationalId"], "verified": true})
        }));

        let request = GatewayRequest::post(restricted_identity(), json!({"nationalId": "X1"}))
            .with_operation(Operation::Read);
        let value = fx.gateway.call(request).await.unwrap();
        assert_eq!(value, json!({"echo": "X1", "verified": true}));

        let sent = &fx.transport.requests()[0];
        assert!(sent.secure_route);
        assert_eq!(sent.headers[headers::SECURE_ROUTE], "required");
        assert_eq!(sent.headers[headers::PAYLOAD_ENCODING], "chacha20poly1305");
        assert_eq!(sent.headers[headers::DATA_CLASSIFICATION], "restricted");
        assert_eq!(sent.headers[headers::COMPLIANCE_TAG], "gov-data-protection-v1");

        // body on the wire is not the plaintext
        let wire = sent.body.clone().unwrap();
        assert!(!String::from_utf8_lossy(&wire).contains("X1"));

        // signature covers the plaintext body
        let plaintext = PayloadCipher::new(&PAYLOAD_KEY).open_envelope(&wire).unwrap();
        let signature = signature_from_headers(&sent.headers).unwrap();
        assert_eq!(signature.certificate_id, "GOV-CERT-001");
        let verifying_key = fx.credentials.active().unwrap().signer().verifying_key();
        verify_signature(&verifying_key, "POST", &request_target(&sent.url), &plaintext, &signature).unwrap();

        let record = &fx.audit.records()[0];
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.retention_days, Some(2555));
        assert!(fx.gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_restricted_get_is_never_cached() {
        let fx = initialized(encrypted_responder(|_| json!({"ok": true})));
        let endpoint = EndpointDescriptor::new(ServiceIdentifier::IdentityRegistry, "/identities/X1", Classification::Restricted);

        fx.gateway.call(GatewayRequest::get(endpoint.clone())).await.unwrap();
        fx.gateway.call(GatewayRequest::get(endpoint)).await.unwrap();

        assert_eq!(fx.transport.call_count(), 2);
        assert!(fx.gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_response_fails_closed() {
        let fx = initialized(MockTransport::new(|_| {
            let sealed = PayloadCipher::new(&PAYLOAD_KEY).seal_envelope(b"{\"ok\":true}").unwrap();
            let mut envelope: Value = serde_json::from_slice(&sealed).unwrap();
            let text = envelope["ciphertext"].as_str().unwrap().to_string();
            let flipped = if text.starts_with('A') { "B" } else { "A" };
            envelope["ciphertext"] = Value::String(format!("{}{}", flipped, &text[1..]));
            Ok(TransportResponse::json(StatusCode::OK, &envelope))
        }));

        let request = GatewayRequest::post(restricted_identity(), json!({})).with_operation(Operation::Read);
        let result = fx.gateway.call(request).await;

        assert!(matches!(result, Err(Error::Decryption(_))));
        assert_eq!(fx.audit.records()[0].outcome, AuditOutcome::Failure);
    }

    #[tokio::test]
    async fn test_plaintext_response_to_encrypted_request_fails_closed() {
        let fx = initialized(MockTransport::json(StatusCode::OK, json!({"isValid": true})));

        let request = GatewayRequest::post(restricted_identity(), json!({})).with_operation(Operation::Read);
        assert!(matches!(fx.gateway.call(request).await, Err(Error::Decryption(_))));
    }

    #[tokio::test]
    async fn test_downstream_error_status_hides_body() {
        let fx = fixture(MockTransport::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"detail": "citizen 123-45-6789 not found"}),
        ));

        let error = fx.gateway.call(GatewayRequest::get(public_schedules())).await.unwrap_err();
        assert!(matches!(
            error,
            Error::Downstream {
                source: TransportError::Status(500),
                ..
            }
        ));
        assert_eq!(error.category().user_message(), "service unavailable");
        assert!(!error.to_string().contains("123-45-6789"));

        let record = &fx.audit.records()[0];
        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert!(!record.error_message.as_deref().unwrap_or_default().contains("123-45-6789"));
        assert_eq!(fx.gateway.metrics().calls(ServiceIdentifier::BenefitsSystem, "failure"), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_downstream_failure() {
        let transport = MockTransport::json(StatusCode::OK, json!({})).with_delay(Duration::from_secs(5));
        let options = GatewayOptions {
            timeout: Duration::from_millis(50),
            ..GatewayOptions::default()
        };
        let fx = fixture_with(transport, default_registry(), options);

        let result = fx.gateway.call(GatewayRequest::get(public_schedules())).await;
        assert!(matches!(
            result,
            Err(Error::Downstream {
                source: TransportError::Timeout,
                ..
            })
        ));
        assert_eq!(fx.audit.records()[0].outcome, AuditOutcome::Failure);
    }

    #[tokio::test]
    async fn test_cancelled_call_is_audited() {
        let transport = MockTransport::json(StatusCode::OK, json!({})).with_delay(Duration::from_secs(5));
        let fx = fixture(transport);

        let call = fx.gateway.call(GatewayRequest::get(public_schedules()));
        assert!(tokio::time::timeout(Duration::from_millis(50), call).await.is_err());

        // let the spawned audit write run
        tokio::time::sleep(Duration::from_millis(20)).await;

        let records = fx.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AuditOutcome::Cancelled);
        assert!(!records[0].success);
        assert_eq!(fx.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_audited_failure() {
        #[derive(Debug, serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            reference: String,
        }

        let fx = fixture(MockTransport::json(StatusCode::OK, json!({"unexpected": 1})));
        let result = fx.gateway.call_typed::<Expected>(GatewayRequest::get(public_schedules())).await;

        assert!(matches!(result, Err(Error::InvalidResponse { .. })));
        assert_eq!(fx.audit.records()[0].outcome, AuditOutcome::Failure);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_change_result() {
        let mut sink = MockAuditSink::new();
        sink.expect_append()
            .times(1)
            .returning(|_| Err(Error::Internal("disk full".into())));
        let gateway = gateway_with_sink(
            MockTransport::json(StatusCode::OK, json!({"schedules": []})),
            Arc::new(sink),
        );

        let value = gateway.call(GatewayRequest::get(public_schedules())).await.unwrap();
        assert_eq!(value, json!({"schedules": []}));
        assert_eq!(gateway.metrics().audit_failures(), 1);
    }

    #[tokio::test]
    async fn test_rotation_is_seen_by_next_call() {
        let fx = initialized(MockTransport::json(StatusCode::OK, json!({})));
        let endpoint = EndpointDescriptor::new(ServiceIdentifier::UtilityProvider, "/status", Classification::Internal);

        fx.gateway.call(GatewayRequest::get(endpoint.clone()).with_param("n", "1")).await.unwrap();

        let mut rotated = valid_credential();
        rotated.certificate_id = "GOV-CERT-002".into();
        fx.gateway.initialize(rotated).unwrap();
        fx.gateway.call(GatewayRequest::get(endpoint).with_param("n", "2")).await.unwrap();

        let sent = fx.transport.requests();
        assert_eq!(sent[0].headers[headers::CERTIFICATE_ID], "GOV-CERT-001");
        assert_eq!(sent[1].headers[headers::CERTIFICATE_ID], "GOV-CERT-002");
    }
}
