//! Gateway fixtures shared by unit tests

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Duration, Utc};
use ed25519_dalek::SigningKey;
use http::StatusCode;
use serde_json::Value;

use crate::audit::{AuditLogger, AuditSink, MemoryAuditSink};
use crate::config::Settings;
use crate::crypto::PayloadCipher;
use crate::gateway::pipeline::{GatewayCore, GatewayOptions};
use crate::identity::{Credential, CredentialManager, InMemoryKeyStore, KeyMaterial, DEFAULT_TRUSTED_ISSUERS};
use crate::policy::ZeroTrustValidator;
use crate::service::ServiceRegistry;
use crate::telemetry::GatewayMetrics;
use crate::transport::{MockTransport, TransportResponse};
use crate::types::Environment;

pub(crate) const PAYLOAD_KEY: [u8; 32] = [42u8; 32];
pub(crate) const SIGNING_SEED: [u8; 32] = [7u8; 32];

pub(crate) struct Fixture {
    pub gateway: GatewayCore,
    pub transport: Arc<MockTransport>,
    pub audit: Arc<MemoryAuditSink>,
    pub credentials: Arc<CredentialManager>,
}

pub(crate) fn default_registry() -> ServiceRegistry {
    ServiceRegistry::from_settings(&Settings::default().services, Environment::Development)
        .expect("default services resolve")
}

pub(crate) fn credential_manager() -> Arc<CredentialManager> {
    let store = InMemoryKeyStore::new();
    store.insert(
        "gateway",
        KeyMaterial {
            signing_key: SigningKey::from_bytes(&SIGNING_SEED),
            payload_key: PAYLOAD_KEY,
        },
    );
    Arc::new(CredentialManager::new(
        DEFAULT_TRUSTED_ISSUERS.iter().map(|s| s.to_string()).collect(),
        Arc::new(store),
    ))
}

pub(crate) fn valid_credential() -> Credential {
    Credential {
        certificate_id: "GOV-CERT-001".to_string(),
        public_key: BASE64.encode(SigningKey::from_bytes(&SIGNING_SEED).verifying_key().as_bytes()),
        private_key_ref: "gateway".to_string(),
        issuer: DEFAULT_TRUSTED_ISSUERS[0].to_string(),
        valid_until: Utc::now() + Duration::days(90),
    }
}

fn build(
    transport: Arc<MockTransport>,
    registry: ServiceRegistry,
    options: GatewayOptions,
    credentials: Arc<CredentialManager>,
    sink: Arc<dyn AuditSink>,
) -> GatewayCore {
    let metrics = GatewayMetrics::new().expect("metrics");
    GatewayCore::new(
        registry,
        transport,
        credentials,
        ZeroTrustValidator::new(),
        AuditLogger::new(sink, metrics.clone()),
        metrics,
        options,
    )
}

pub(crate) fn fixture_with(transport: MockTransport, registry: ServiceRegistry, options: GatewayOptions) -> Fixture {
    let transport = Arc::new(transport);
    let audit = Arc::new(MemoryAuditSink::new());
    let credentials = credential_manager();
    let gateway = build(transport.clone(), registry, options, credentials.clone(), audit.clone());

    Fixture {
        gateway,
        transport,
        audit,
        credentials,
    }
}

/// Gateway without an active credential
pub(crate) fn fixture(transport: MockTransport) -> Fixture {
    fixture_with(transport, default_registry(), GatewayOptions::default())
}

/// Gateway with [`valid_credential`] active
pub(crate) fn initialized(transport: MockTransport) -> Fixture {
    let fx = fixture(transport);
    fx.gateway.initialize(valid_credential()).expect("credential initializes");
    fx
}

pub(crate) fn gateway_with_sink(transport: MockTransport, sink: Arc<dyn AuditSink>) -> GatewayCore {
    build(
        Arc::new(transport),
        default_registry(),
        GatewayOptions::default(),
        credential_manager(),
        sink,
    )
}

/// Downstream stub speaking the encrypted envelope protocol
pub(crate) fn encrypted_responder<F>(respond: F) -> MockTransport
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    MockTransport::new(move |request| {
        let cipher = PayloadCipher::new(&PAYLOAD_KEY);
        let body = request.body.clone().unwrap_or_default();
        let plaintext = cipher.open_envelope(&body).expect("request is an envelope");
        let parsed = if plaintext.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&plaintext).expect("request is JSON")
        };

        let reply = respond(&parsed).to_string();
        let sealed = cipher.seal_envelope(reply.as_bytes()).expect("seal reply");
        let envelope: Value = serde_json::from_slice(&sealed).expect("envelope is JSON");
        Ok(TransportResponse::json(StatusCode::OK, &envelope))
    })
}
