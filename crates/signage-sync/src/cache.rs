//! The branch's local slide cache.
//!
//! On-disk layout under the cache root:
//!
//! ```text
//! CURRENT              # number of the generation on display
//! gen-<n>/             # a fully downloaded slide set
//!     manifest.json
//!     slide_1.png
//! staging-<uuid>/      # a set being written; never displayed
//! ```
//!
//! The in-memory [`CacheSnapshot`] and the rotation cursor live together
//! behind a single mutex. Installing a new set swaps the
//! snapshot and resets the cursor in the same critical section.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signage_types::{BranchStatus, Slide, SlideId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

const CURRENT_FILE: &str = "CURRENT";
const MANIFEST_FILE: &str = "manifest.json";
const GENERATION_PREFIX: &str = "gen-";
const STAGING_PREFIX: &str = "staging-";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    generation: u64,
    source_version: u64,
    synced_at: DateTime<Utc>,
    slides: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    id: SlideId,
    digest: String,
}

/// A slide held by the local cache, with the file it was written to.
#[derive(Clone, Debug)]
pub struct CachedSlide {
    slide: Slide,
    path: PathBuf,
}

impl CachedSlide {
    pub fn id(&self) -> SlideId {
        self.slide.id()
    }

    pub fn slide(&self) -> &Slide {
        &self.slide
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One complete, immutable slide set.
#[derive(Clone, Debug, Default)]
pub struct CacheSnapshot {
    generation: u64,
    source_version: u64,
    slides: Vec<CachedSlide>,
}

impl CacheSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source_version(&self) -> u64 {
        self.source_version
    }

    pub fn slides(&self) -> &[CachedSlide] {
        &self.slides
    }

    pub fn ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(CachedSlide::id).collect()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.slides.iter().map(|s| s.slide.len()).sum()
    }
}

/// The slide set on display and the rotation cursor into it.
#[derive(Debug, Default)]
struct DisplayState {
    snapshot: Arc<CacheSnapshot>,
    cursor: usize,
}

/// Disk-backed cache of the last fully downloaded slide set.
#[derive(Debug)]
pub struct LocalCache {
    root: PathBuf,
    state: Mutex<DisplayState>,
}

impl LocalCache {
    /// Open the cache at `root`, reloading the generation `CURRENT` names.
    ///
    /// A missing or corrupt generation starts the cache empty; it is
    /// replaced by the next successful sync.
    pub fn open(root: impl Into<PathBuf>) -> SyncResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let cache = Self { root, state: Mutex::new(DisplayState::default()) };

        let snapshot = match cache.load_current() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                warn!(root = %cache.root.display(), error = %e, "discarding unreadable cache");
                CacheSnapshot::default()
            }
        };
        cache.prune(snapshot.generation);
        info!(
            root = %cache.root.display(),
            generation = snapshot.generation,
            slides = snapshot.len(),
            "local cache opened"
        );
        cache.lock().snapshot = Arc::new(snapshot);
        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        self.root.join(format!("{GENERATION_PREFIX}{generation}"))
    }

    /// The slide set currently on display.
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.lock().snapshot)
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    pub fn status(&self) -> BranchStatus {
        let state = self.lock();
        BranchStatus {
            generation: state.snapshot.generation,
            source_version: state.snapshot.source_version,
            slides: state.snapshot.ids(),
            cursor: state.cursor,
        }
    }

    /// The slide under the cursor, advancing the cursor by one.
    ///
    /// Returns `None` for an empty cache. The size is read on every call and
    /// the cursor wraps modulo it.
    pub fn advance(&self) -> Option<(usize, CachedSlide)> {
        let mut state = self.lock();
        let len = state.snapshot.len();
        if len == 0 {
            return None;
        }
        let index = state.cursor % len;
        let slide = state.snapshot.slides[index].clone();
        state.cursor = (index + 1) % len;
        Some((index, slide))
    }

    /// Write `slides` as a new generation and put it on display.
    ///
    /// If anything fails before the swap, the cache on disk and on display
    /// is unchanged. Generations older than the previous one are pruned.
    /// Installs must not run concurrently; [`SyncAgent`](crate::SyncAgent)
    /// serializes them.
    pub fn install(&self, source_version: u64, mut slides: Vec<Slide>) -> SyncResult<Arc<CacheSnapshot>> {
        slides.sort_by_key(Slide::ordinal);
        let generation = self
            .lock()
            .snapshot
            .generation
            .checked_add(1)
            .ok_or_else(|| SyncError::Internal("cache generation counter exhausted".into()))?;

        let staging = self.root.join(format!("{STAGING_PREFIX}{}", Uuid::now_v7()));
        fs::create_dir(&staging)?;
        if let Err(e) = write_staging(&staging, generation, source_version, &slides) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), error = %cleanup, "failed to remove staging directory");
            }
            return Err(e);
        }

        let target = self.generation_dir(generation);
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&staging, &target)?;
        self.set_current(generation)?;

        let snapshot = Arc::new(CacheSnapshot {
            generation,
            source_version,
            slides: slides
                .into_iter()
                .map(|slide| CachedSlide { path: target.join(slide.id().file_name()), slide })
                .collect(),
        });
        {
            let mut state = self.lock();
            state.snapshot = Arc::clone(&snapshot);
            state.cursor = 0;
        }
        debug!(generation, slides = snapshot.len(), "cache generation installed");

        self.prune(generation);
        Ok(snapshot)
    }

    fn set_current(&self, generation: u64) -> SyncResult<()> {
        let temp = self.root.join(format!("{CURRENT_FILE}.{}.tmp", Uuid::now_v7()));
        fs::write(&temp, format!("{generation}\n"))?;
        fs::rename(&temp, self.root.join(CURRENT_FILE))?;
        Ok(())
    }

    fn load_current(&self) -> SyncResult<Option<CacheSnapshot>> {
        let text = match fs::read_to_string(self.root.join(CURRENT_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let generation: u64 = text.trim().parse().map_err(|_| SyncError::CorruptCache {
            generation: 0,
            reason: format!("unparseable {CURRENT_FILE} pointer: {:?}", text.trim()),
        })?;
        self.load_generation(generation).map(Some)
    }

    fn load_generation(&self, generation: u64) -> SyncResult<CacheSnapshot> {
        let dir = self.generation_dir(generation);
        let corrupt = |reason: String| SyncError::CorruptCache { generation, reason };

        let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
        if manifest.generation != generation {
            return Err(corrupt(format!("manifest claims generation {}", manifest.generation)));
        }

        let mut slides = Vec::with_capacity(manifest.slides.len());
        for entry in manifest.slides {
            let path = dir.join(entry.id.file_name());
            let slide = Slide::new(entry.id, fs::read(&path)?);
            if slide.digest() != entry.digest {
                return Err(corrupt(format!("digest mismatch for {}", entry.id)));
            }
            slides.push(CachedSlide { slide, path });
        }
        Ok(CacheSnapshot { generation, source_version: manifest.source_version, slides })
    }

    /// Remove staging leftovers, stray pointer temp files, and every
    /// generation other than `current` and the one before it.
    fn prune(&self, current: u64) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "cannot list cache directory");
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let path = entry.path();
            let removed = if name.starts_with(STAGING_PREFIX) {
                fs::remove_dir_all(&path)
            } else if let Some(n) = name.strip_prefix(GENERATION_PREFIX) {
                match n.parse::<u64>() {
                    Ok(n) if n.saturating_add(1) < current || n > current => fs::remove_dir_all(&path),
                    _ => continue,
                }
            } else if name.starts_with(CURRENT_FILE) && name.ends_with(".tmp") {
                fs::remove_file(&path)
            } else {
                continue;
            };
            if let Err(e) = removed {
                warn!(path = %path.display(), error = %e, "failed to prune");
            }
        }
    }
}

fn write_staging(staging: &Path, generation: u64, source_version: u64, slides: &[Slide]) -> SyncResult<()> {
    for slide in slides {
        fs::write(staging.join(slide.id().file_name()), slide.data())?;
    }
    let manifest = Manifest {
        generation,
        source_version,
        synced_at: Utc::now(),
        slides: slides
            .iter()
            .map(|s| ManifestEntry { id: s.id(), digest: s.digest().to_string() })
            .collect(),
    };
    fs::write(staging.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slides(tag: &str, n: u32) -> Vec<Slide> {
        (1..=n)
            .map(|i| Slide::new(SlideId::from_ordinal(i).unwrap(), format!("{tag}{i}").into_bytes()))
            .collect()
    }

    fn dir_names(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn fresh_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.snapshot().generation(), 0);
        assert!(cache.advance().is_none());
    }

    #[test]
    fn install_writes_generation_and_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        cache.install(1, slides("a", 3)).unwrap();
        cache.advance();
        cache.advance();
        assert_eq!(cache.cursor(), 2);

        let snapshot = cache.install(2, slides("b", 2)).unwrap();
        assert_eq!(snapshot.generation(), 2);
        assert_eq!(cache.cursor(), 0);
        assert_eq!(fs::read(snapshot.slides()[1].path()).unwrap(), b"b2");
    }

    #[test]
    fn install_sorts_by_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        let mut set = slides("s", 3);
        set.reverse();
        let snapshot = cache.install(1, set).unwrap();
        let ordinals: Vec<u32> = snapshot.ids().iter().map(SlideId::ordinal).collect();
        assert_eq!(ordinals, [1, 2, 3]);
    }

    #[test]
    fn advance_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        cache.install(1, slides("x", 2)).unwrap();
        let visited: Vec<usize> = (0..5).map(|_| cache.advance().unwrap().0).collect();
        assert_eq!(visited, [0, 1, 0, 1, 0]);
    }

    #[test]
    fn empty_install_is_a_valid_generation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        cache.install(1, slides("a", 2)).unwrap();
        let snapshot = cache.install(2, Vec::new()).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generation(), 2);
        assert!(cache.advance().is_none());
    }

    #[test]
    fn reopen_restores_last_generation() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = LocalCache::open(dir.path()).unwrap();
            cache.install(4, slides("r", 3)).unwrap();
        }
        let cache = LocalCache::open(dir.path()).unwrap();
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.source_version(), 4);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.slides()[2].slide().data().as_ref(), b"r3");
    }

    #[test]
    fn corrupt_generation_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = LocalCache::open(dir.path()).unwrap();
            cache.install(1, slides("c", 2)).unwrap();
        }
        fs::write(dir.path().join("gen-1").join("slide_2.png"), b"tampered").unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn keeps_current_and_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        fs::create_dir(dir.path().join(format!("{STAGING_PREFIX}abandoned"))).unwrap();
        for v in 1..=4 {
            cache.install(v, slides("g", 1)).unwrap();
        }
        assert_eq!(dir_names(dir.path()), [CURRENT_FILE, "gen-3", "gen-4"]);
    }

    #[test]
    fn stray_maximal_generation_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let stray = dir.path().join(format!("{GENERATION_PREFIX}{}", u64::MAX));
        fs::create_dir(&stray).unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        assert!(!stray.exists());

        cache.install(1, slides("a", 1)).unwrap();
        fs::create_dir(&stray).unwrap();
        cache.install(2, slides("b", 1)).unwrap();
        assert_eq!(dir_names(dir.path()), [CURRENT_FILE, "gen-1", "gen-2"]);
    }

    #[test]
    fn status_reflects_state() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path()).unwrap();
        cache.install(9, slides("s", 2)).unwrap();
        cache.advance();
        let status = cache.status();
        assert_eq!(status.generation, 1);
        assert_eq!(status.source_version, 9);
        assert_eq!(status.slides.len(), 2);
        assert_eq!(status.cursor, 1);
    }
}
