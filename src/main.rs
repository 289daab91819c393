use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use secure_gov_gateway::{
    api::{ApiServer, ApiState},
    audit::{AuditLogger, AuditSink, JsonlAuditSink, MemoryAuditSink},
    config::{AuditSinkKind, Settings},
    controller::CredentialExpiryMonitor,
    gateway::{GatewayCore, GatewayOptions},
    identity::{CredentialManager, FileKeyStore},
    policy::ZeroTrustValidator,
    service::ServiceRegistry,
    telemetry::{self, GatewayMetrics},
    transport::ReqwestTransport,
};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;

    // 2. Initialize telemetry
    telemetry::init_logging(&settings.telemetry, &settings.general.log_level)?;
    info!(
        "Starting {} {} ({})",
        settings.general.app_name, settings.general.client_version, settings.general.environment
    );

    // 3. Resolve downstream services once for this environment
    let registry = ServiceRegistry::from_settings(&settings.services, settings.general.environment)?;

    // 4. Audit trail
    let metrics = GatewayMetrics::new()?;
    let sink: Arc<dyn AuditSink> = match settings.audit.sink {
        AuditSinkKind::Memory => Arc::new(MemoryAuditSink::new()),
        AuditSinkKind::Jsonl => Arc::new(JsonlAuditSink::open(&settings.audit.path).await?),
    };
    info!("Audit sink: {:?}", settings.audit.sink);
    let audit = AuditLogger::new(sink, metrics.clone());

    // 5. Credential manager and transport
    let credentials = Arc::new(CredentialManager::new(
        settings.trust.trusted_issuers.clone(),
        Arc::new(FileKeyStore::new(&settings.keys.dir)),
    ));
    let user_agent = format!("{}/{}", settings.general.app_name, settings.general.client_version);
    let transport = Arc::new(ReqwestTransport::new(settings.transport.timeout(), &user_agent)?);

    let gateway = Arc::new(GatewayCore::new(
        registry,
        transport,
        credentials.clone(),
        ZeroTrustValidator::new(),
        audit,
        metrics.clone(),
        GatewayOptions::from_settings(&settings),
    ));

    // 6. Activate the configured credential
    match settings.credential.clone() {
        Some(credential) => gateway.initialize(credential.into())?,
        None => warn!("No credential configured; only Public endpoints are available"),
    }

    // 7. Credential expiry monitor
    let monitor = Arc::new(CredentialExpiryMonitor::new(
        credentials,
        metrics,
        settings.controller.expiry_warning_days,
    ));
    let monitor_task = monitor.start(Duration::from_secs(settings.controller.expiry_check_seconds));

    // 8. Admin API until shutdown
    if settings.api.enabled {
        let state = ApiState {
            gateway,
            environment: settings.general.environment,
            metrics_enabled: settings.telemetry.enable_metrics,
        };
        let server = ApiServer::new(&settings.api.listen_addr, state)?;
        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        };
        server.run_until(shutdown).await?;
    } else {
        info!("Admin API disabled; waiting for shutdown signal");
        signal::ctrl_c().await?;
    }

    if let Some(task) = monitor_task {
        task.abort();
    }
    info!("Gateway stopped");

    Ok(())
}
