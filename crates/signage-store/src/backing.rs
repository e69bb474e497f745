//! Filesystem persistence for inventory snapshots.
//!
//! On-disk layout under the backing root:
//!
//! ```text
//! CURRENT              # decimal version of the live generation
//! gen-<version>/       # one directory per published generation
//!     manifest.json    # version, publish time, ids and digests
//!     slide_1.png
//!     slide_2.png
//! staging-<uuid>/      # a generation being written; never read
//! ```
//!
//! A generation is written into a staging directory and renamed into place
//! before `CURRENT` moves. `CURRENT` itself is replaced via temp file and
//! rename, so a crash leaves either the old or the new pointer.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signage_types::{Slide, SlideId};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::snapshot::InventorySnapshot;

const CURRENT_FILE: &str = "CURRENT";
const MANIFEST_FILE: &str = "manifest.json";
const GENERATION_PREFIX: &str = "gen-";
const STAGING_PREFIX: &str = "staging-";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u64,
    published_at: DateTime<Utc>,
    slides: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    id: SlideId,
    digest: String,
}

/// Write `data` and flush it to disk before returning.
fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Directory-backed persistence for [`InventorySnapshot`]s.
#[derive(Clone, Debug)]
pub struct DiskBacking {
    root: PathBuf,
}

impl DiskBacking {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, version: u64) -> PathBuf {
        self.root.join(format!("{GENERATION_PREFIX}{version}"))
    }

    /// Write `snapshot` as a complete generation directory.
    pub fn write_generation(&self, snapshot: &InventorySnapshot) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        let staging = self.root.join(format!("{STAGING_PREFIX}{}", Uuid::now_v7()));
        fs::create_dir(&staging)?;

        if let Err(e) = self.fill_staging(&staging, snapshot) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), error = %cleanup, "failed to remove staging directory");
            }
            return Err(e);
        }

        let target = self.generation_dir(snapshot.version());
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&staging, &target)?;
        debug!(version = snapshot.version(), path = %target.display(), "generation written");
        Ok(())
    }

    fn fill_staging(&self, staging: &Path, snapshot: &InventorySnapshot) -> StoreResult<()> {
        for slide in snapshot.slides() {
            write_synced(&staging.join(slide.id().file_name()), slide.data())?;
        }
        let manifest = Manifest {
            version: snapshot.version(),
            published_at: snapshot.published_at().unwrap_or_else(Utc::now),
            slides: snapshot
                .slides()
                .iter()
                .map(|s| ManifestEntry { id: s.id(), digest: s.digest().to_string() })
                .collect(),
        };
        write_synced(&staging.join(MANIFEST_FILE), &serde_json::to_vec_pretty(&manifest)?)?;
        Ok(())
    }

    /// Point `CURRENT` at `version`.
    pub fn set_current(&self, version: u64) -> StoreResult<()> {
        let temp = self.root.join(format!("{CURRENT_FILE}.{}.tmp", Uuid::now_v7()));
        write_synced(&temp, format!("{version}\n").as_bytes())?;
        fs::rename(&temp, self.root.join(CURRENT_FILE))?;
        Ok(())
    }

    /// The version `CURRENT` points at, if any generation was ever published.
    pub fn current_version(&self) -> StoreResult<Option<u64>> {
        let text = match fs::read_to_string(self.root.join(CURRENT_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        text.trim()
            .parse()
            .map(Some)
            .map_err(|_| StoreError::CorruptGeneration {
                generation: 0,
                reason: format!("unparseable {CURRENT_FILE} pointer: {:?}", text.trim()),
            })
    }

    /// Load the generation `CURRENT` points at.
    pub fn load_current(&self) -> StoreResult<Option<InventorySnapshot>> {
        match self.current_version()? {
            Some(version) => self.load_generation(version).map(Some),
            None => Ok(None),
        }
    }

    fn load_generation(&self, version: u64) -> StoreResult<InventorySnapshot> {
        let dir = self.generation_dir(version);
        let corrupt = |reason: String| StoreError::CorruptGeneration { generation: version, reason };

        let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
        if manifest.version != version {
            return Err(corrupt(format!("manifest claims version {}", manifest.version)));
        }

        let mut slides = Vec::with_capacity(manifest.slides.len());
        for entry in manifest.slides {
            let slide = Slide::new(entry.id, fs::read(dir.join(entry.id.file_name()))?);
            if slide.digest() != entry.digest {
                return Err(corrupt(format!("digest mismatch for {}", entry.id)));
            }
            slides.push(slide);
        }
        Ok(InventorySnapshot::new(version, manifest.published_at, slides))
    }

    /// Remove every generation except `keep`, plus abandoned staging directories.
    ///
    /// Failures are logged; pruning never fails the caller.
    pub fn prune(&self, keep: u64) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "cannot list backing directory");
                return;
            }
        };
        let keep_name = format!("{GENERATION_PREFIX}{keep}");
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let stale = name.starts_with(STAGING_PREFIX)
                || (name.starts_with(GENERATION_PREFIX) && name != keep_name);
            if stale {
                if let Err(e) = fs::remove_dir_all(entry.path()) {
                    warn!(path = %entry.path().display(), error = %e, "failed to prune");
                }
            }
        }
    }
}
