use std::path::PathBuf;
use std::sync::Arc;

use signage_raster::RasterPipeline;
use signage_store::{InventorySnapshot, SlideInventory};
use signage_types::{Deck, Slide, SlideId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::broadcast::{BroadcastReport, Broadcaster, HttpNotifier};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Result of a successful deck submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub version: u64,
    pub slides: usize,
}

/// The central distribution service.
///
/// Owns the rasterization pipeline and the slide inventory. At most one
/// conversion runs at a time; further submissions queue on `conversion`.
pub struct DistributionService {
    pipeline: RasterPipeline,
    inventory: Arc<SlideInventory>,
    broadcaster: Broadcaster,
    conversion: Arc<Mutex<()>>,
    archive_dir: Option<PathBuf>,
}

impl DistributionService {
    pub fn new(pipeline: RasterPipeline, inventory: Arc<SlideInventory>, broadcaster: Broadcaster) -> Self {
        Self {
            pipeline,
            inventory,
            broadcaster,
            conversion: Arc::new(Mutex::new(())),
            archive_dir: None,
        }
    }

    /// Keep a copy of each successfully rasterized deck in `dir`.
    pub fn with_archive(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Build the service with external converters and a disk-backed inventory.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let inventory = Arc::new(SlideInventory::open(config.inventory_dir())?);
        let pipeline = RasterPipeline::from_config(&config.converter, config.scratch_root());
        let notifier = HttpNotifier::new(config.notify_timeout())?;
        let broadcaster = Broadcaster::new(Arc::new(notifier), config.branch_urls()?);

        let service = Self::new(pipeline, inventory, broadcaster);
        Ok(if config.archive_decks {
            service.with_archive(config.archive_dir())
        } else {
            service
        })
    }

    /// Rasterize `deck`, publish the result, and broadcast a reload.
    ///
    /// On conversion failure the inventory is unchanged and nothing is
    /// broadcast. The broadcast is not awaited.
    pub async fn submit(&self, deck: Deck) -> ServerResult<SubmitOutcome> {
        let in_flight = Arc::clone(&self.conversion).lock_owned().await;

        let slides = self.pipeline.rasterize(&deck).await?;
        self.archive(&deck).await;

        let snapshot = self
            .publish(deck.filename().to_string(), slides, in_flight)
            .await
            .map_err(|e| ServerError::Internal(format!("publish task failed: {e}")))??;

        Ok(SubmitOutcome {
            version: snapshot.version(),
            slides: snapshot.len(),
        })
    }

    /// Publish `slides` and broadcast a reload on a task of its own.
    ///
    /// Once started, the publish and its broadcast complete even if the
    /// caller stops waiting. `in_flight` is released after the publish.
    fn publish(
        &self,
        deck: String,
        slides: Vec<Slide>,
        in_flight: OwnedMutexGuard<()>,
    ) -> JoinHandle<ServerResult<Arc<InventorySnapshot>>> {
        let inventory = Arc::clone(&self.inventory);
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            let snapshot = tokio::task::spawn_blocking(move || inventory.publish(slides))
                .await
                .map_err(|e| ServerError::Internal(format!("publish task failed: {e}")))??;
            drop(in_flight);

            info!(
                deck = %deck,
                version = snapshot.version(),
                slides = snapshot.len(),
                "deck published"
            );
            drop(broadcaster.broadcast());
            Ok::<_, ServerError>(snapshot)
        })
    }

    async fn archive(&self, deck: &Deck) {
        let Some(dir) = &self.archive_dir else { return };
        let name = format!(
            "{}_{}",
            deck.submitted_at().format("%Y%m%dT%H%M%S"),
            deck.safe_file_name()
        );
        let path = dir.join(name);
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, deck.data()).await
        };
        if let Err(e) = written.await {
            warn!(path = %path.display(), error = %e, "failed to archive deck");
        }
    }

    /// The current inventory snapshot.
    pub fn list(&self) -> Arc<InventorySnapshot> {
        self.inventory.snapshot()
    }

    pub fn fetch(&self, id: &SlideId) -> ServerResult<Slide> {
        Ok(self.inventory.fetch(id)?)
    }

    /// Broadcast a reload without publishing anything.
    pub fn reload(&self) -> JoinHandle<BroadcastReport> {
        info!(branches = self.broadcaster.branch_count(), "manual reload requested");
        self.broadcaster.broadcast()
    }

    pub fn branch_count(&self) -> usize {
        self.broadcaster.branch_count()
    }

    pub fn inventory(&self) -> &Arc<SlideInventory> {
        &self.inventory
    }
}
