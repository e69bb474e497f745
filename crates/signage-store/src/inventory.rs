use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use signage_types::{Slide, SlideId};
use tracing::{info, warn};

use crate::backing::DiskBacking;
use crate::error::{StoreError, StoreResult};
use crate::snapshot::InventorySnapshot;

/// The authoritative, atomically swapped slide inventory.
///
/// Readers clone the current `Arc<InventorySnapshot>` and work on that
/// snapshot; [`publish`](Self::publish) builds the next snapshot, persists it,
/// and only then swaps the reference. A reader concurrent with a publish sees
/// either the old or the new snapshot, never a mixture.
pub struct SlideInventory {
    current: RwLock<Arc<InventorySnapshot>>,
    backing: Option<DiskBacking>,
    publish_lock: Mutex<()>,
}

impl SlideInventory {
    /// An empty inventory with no persistence.
    pub fn in_memory() -> Self {
        Self::with_snapshot(InventorySnapshot::empty(), None)
    }

    /// Open a disk-backed inventory, reloading the last published generation.
    ///
    /// An unreadable or corrupt generation is discarded and the inventory
    /// starts empty until the next publish.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let backing = DiskBacking::new(root);
        let snapshot = match backing.load_current() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                warn!(root = %backing.root().display(), error = %e, "discarding unreadable inventory");
                InventorySnapshot::empty()
            }
        };
        backing.prune(snapshot.version());
        info!(
            root = %backing.root().display(),
            version = snapshot.version(),
            slides = snapshot.len(),
            "inventory opened"
        );
        Ok(Self::with_snapshot(snapshot, Some(backing)))
    }

    fn with_snapshot(snapshot: InventorySnapshot, backing: Option<DiskBacking>) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            backing,
            publish_lock: Mutex::new(()),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<InventorySnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole inventory with `slides`.
    ///
    /// Publishes are serialized. If persisting fails the live snapshot is
    /// left untouched.
    pub fn publish(&self, slides: Vec<Slide>) -> StoreResult<Arc<InventorySnapshot>> {
        let _guard = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let version = self.snapshot().version() + 1;
        let next = Arc::new(InventorySnapshot::new(version, Utc::now(), slides));

        if let Some(backing) = &self.backing {
            backing.write_generation(&next)?;
            backing.set_current(version)?;
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        if let Some(backing) = &self.backing {
            backing.prune(version);
        }

        info!(version, slides = next.len(), bytes = next.total_bytes(), "inventory published");
        Ok(next)
    }

    /// Identifiers of the last completed publish, in ordinal order.
    pub fn list(&self) -> Vec<SlideId> {
        self.snapshot().ids()
    }

    /// The slide with identifier `id` in the current snapshot.
    pub fn fetch(&self, id: &SlideId) -> StoreResult<Slide> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }
}

impl Default for SlideInventory {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for SlideInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("SlideInventory")
            .field("version", &snapshot.version())
            .field("slides", &snapshot.len())
            .field("backing", &self.backing)
            .finish()
    }
}
