//! Pulling the inventory into the local cache.

use std::collections::HashSet;
use std::sync::Arc;

use signage_types::Slide;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::error::{SyncError, SyncResult};
use crate::source::SlideSource;

/// Outcome of one successful sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub generation: u64,
    pub source_version: u64,
    pub slides: usize,
    pub bytes: usize,
}

/// Pulls the full inventory and installs it into the local cache.
pub struct SyncAgent {
    source: Arc<dyn SlideSource>,
    cache: Arc<LocalCache>,
    running: Mutex<()>,
}

impl SyncAgent {
    pub fn new(source: Arc<dyn SlideSource>, cache: Arc<LocalCache>) -> Self {
        Self { source, cache, running: Mutex::new(()) }
    }

    pub fn cache(&self) -> &Arc<LocalCache> {
        &self.cache
    }

    /// List the inventory, download every slide, then install the set.
    ///
    /// All-or-nothing: any failure before the install leaves the cache as
    /// it was. An empty inventory installs an empty cache. Concurrent calls
    /// run one after another.
    pub async fn sync(&self) -> SyncResult<SyncReport> {
        let _running = self.running.lock().await;

        let listing = self.source.list_slides().await?;
        let mut seen = HashSet::with_capacity(listing.slides.len());
        let mut slides = Vec::with_capacity(listing.slides.len());
        for id in listing.slides {
            if !seen.insert(id) {
                return Err(SyncError::InvalidListing(format!("duplicate identifier {id}")));
            }
            let data = self.source.fetch_slide(&id).await?;
            debug!(%id, bytes = data.len(), "slide fetched");
            slides.push(Slide::new(id, data));
        }

        let cache = Arc::clone(&self.cache);
        let version = listing.version;
        let snapshot = tokio::task::spawn_blocking(move || cache.install(version, slides))
            .await
            .map_err(|e| SyncError::Internal(format!("install task failed: {e}")))??;

        let report = SyncReport {
            generation: snapshot.generation(),
            source_version: snapshot.source_version(),
            slides: snapshot.len(),
            bytes: snapshot.total_bytes(),
        };
        info!(
            generation = report.generation,
            source_version = report.source_version,
            slides = report.slides,
            bytes = report.bytes,
            "sync complete"
        );
        Ok(report)
    }
}

/// Wakes the background sync worker.
///
/// Triggers that arrive while a sync is running collapse into a single
/// follow-up sync.
#[derive(Clone, Debug)]
pub struct SyncTrigger {
    notify: Arc<Notify>,
}

impl SyncTrigger {
    /// Spawn the worker that runs `agent.sync()` once per wake-up.
    ///
    /// Sync failures are logged and leave the cache untouched.
    pub fn spawn(agent: Arc<SyncAgent>) -> (Self, JoinHandle<()>) {
        let notify = Arc::new(Notify::new());
        let wakeups = Arc::clone(&notify);
        let worker = tokio::spawn(async move {
            loop {
                wakeups.notified().await;
                if let Err(e) = agent.sync().await {
                    warn!(error = %e, "sync failed; keeping current cache");
                }
            }
        });
        (Self { notify }, worker)
    }

    pub fn trigger(&self) {
        self.notify.notify_one();
    }
}
