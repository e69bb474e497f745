use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::service::DistributionService;

/// The distribution service process.
pub struct SignageServer {
    config: ServerConfig,
}

impl SignageServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the service and router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        let service = Arc::new(DistributionService::from_config(&self.config)?);
        Ok(build_router(service, self.config.max_upload_size))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            branches = self.config.branches.len(),
            data_dir = %self.config.data_dir.display(),
            "signage server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
