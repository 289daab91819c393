use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tracing::{error, info};

use crate::api::routes;
use crate::api::types::ApiState;
use crate::error::Error;
use crate::types::Result;

/// Admin API server
pub struct ApiServer {
    /// Listening address
    address: SocketAddr,
    /// Router
    router: Router,
}

impl ApiServer {
    /// Create a server bound to `listen_addr`
    pub fn new(listen_addr: &str, state: ApiState) -> Result<Self> {
        let address = listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::Configuration(format!("Invalid API address: {}", e)))?;

        Ok(Self {
            address,
            router: routes::create_router(state),
        })
    }

    /// Serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Starting admin API on {}", self.address);

        let server = axum::Server::try_bind(&self.address)
            .map_err(|e| Error::Configuration(format!("Cannot bind admin API to {}: {}", self.address, e)))?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(shutdown);

        if let Err(e) = server.await {
            error!("Admin API error: {}", e);
            return Err(Error::Internal(format!("Admin API error: {}", e)));
        }

        info!("Admin API shut down gracefully");
        Ok(())
    }

    /// Address the server binds to
    pub fn address(&self) -> &SocketAddr {
        &self.address
    }
}
