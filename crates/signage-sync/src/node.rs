use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::agent::{SyncAgent, SyncTrigger};
use crate::cache::LocalCache;
use crate::config::BranchConfig;
use crate::cycler::{Display, DisplayCycler, LogDisplay};
use crate::error::{SyncError, SyncResult};
use crate::listener::{build_branch_router, BranchState};
use crate::source::HttpSlideSource;

/// The branch terminal process.
///
/// Opens the local cache, starts the sync worker and the display cycler,
/// requests a startup sync, and serves the reload listener.
pub struct BranchNode {
    config: BranchConfig,
    display: Arc<dyn Display>,
}

impl BranchNode {
    pub fn new(config: BranchConfig) -> Self {
        Self { config, display: Arc::new(LogDisplay) }
    }

    pub fn with_display(mut self, display: Arc<dyn Display>) -> Self {
        self.display = display;
        self
    }

    pub fn config(&self) -> &BranchConfig {
        &self.config
    }

    pub async fn serve(self) -> SyncResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> SyncResult<()> {
        let server_url = self.config.server_url()?;
        let interval = self.config.rotation_interval()?;

        let cache = Arc::new(LocalCache::open(&self.config.cache_dir)?);
        let source = HttpSlideSource::new(server_url.clone(), self.config.fetch_timeout())?;
        let agent = Arc::new(SyncAgent::new(Arc::new(source), Arc::clone(&cache)));

        let (trigger, _worker) = SyncTrigger::spawn(agent);
        trigger.trigger();

        let cycler = DisplayCycler::new(Arc::clone(&cache), self.display, interval);
        tokio::spawn(cycler.run());

        let app = build_branch_router(BranchState { trigger, cache });
        info!(
            addr = %listener.local_addr()?,
            server = %server_url,
            cache_dir = %self.config.cache_dir.display(),
            rotation_secs = interval.as_secs(),
            "branch listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| SyncError::Internal(e.to_string()))
    }
}
