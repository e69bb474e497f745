//! Timed rotation through the local cache.

use std::sync::Arc;
use std::time::Duration;

use signage_types::SlideId;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cache::{CachedSlide, LocalCache};

/// The surface slides are shown on.
pub trait Display: Send + Sync {
    fn show(&self, slide: &CachedSlide);
    fn show_placeholder(&self);
}

/// Logs what would be shown.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn show(&self, slide: &CachedSlide) {
        info!(slide = %slide.id(), path = %slide.path().display(), "showing slide");
    }

    fn show_placeholder(&self) {
        info!("no slides available");
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Placeholder,
    Shown { index: usize, id: SlideId },
}

/// Rotates through the local cache on a fixed interval.
///
/// Runs independently of syncs; a new cache shows up on the next tick,
/// starting from its first slide.
pub struct DisplayCycler {
    cache: Arc<LocalCache>,
    display: Arc<dyn Display>,
    interval: Duration,
}

impl DisplayCycler {
    pub fn new(cache: Arc<LocalCache>, display: Arc<dyn Display>, interval: Duration) -> Self {
        Self { cache, display, interval }
    }

    /// Show the slide under the cursor and advance, or the placeholder.
    pub fn tick(&self) -> TickOutcome {
        match self.cache.advance() {
            Some((index, slide)) => {
                self.display.show(&slide);
                TickOutcome::Shown { index, id: slide.id() }
            }
            None => {
                self.display.show_placeholder();
                TickOutcome::Placeholder
            }
        }
    }

    /// Tick forever. The first tick fires immediately.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use signage_types::Slide;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Mutex<Vec<String>>,
    }

    impl Display for RecordingDisplay {
        fn show(&self, slide: &CachedSlide) {
            self.shown.lock().unwrap().push(slide.id().file_name());
        }

        fn show_placeholder(&self) {
            self.shown.lock().unwrap().push("placeholder".into());
        }
    }

    fn slides(n: u32) -> Vec<Slide> {
        (1..=n)
            .map(|i| Slide::new(SlideId::from_ordinal(i).unwrap(), vec![i as u8]))
            .collect()
    }

    fn cycler(root: &std::path::Path) -> (DisplayCycler, Arc<LocalCache>, Arc<RecordingDisplay>) {
        let cache = Arc::new(LocalCache::open(root).unwrap());
        let display = Arc::new(RecordingDisplay::default());
        let cycler = DisplayCycler::new(Arc::clone(&cache), display.clone(), Duration::from_millis(10));
        (cycler, cache, display)
    }

    #[test]
    fn empty_cache_shows_placeholder_until_slides_arrive() {
        let dir = tempfile::tempdir().unwrap();
        let (cycler, cache, display) = cycler(dir.path());

        assert_eq!(cycler.tick(), TickOutcome::Placeholder);
        assert_eq!(cycler.tick(), TickOutcome::Placeholder);

        cache.install(1, slides(2)).unwrap();
        assert!(matches!(cycler.tick(), TickOutcome::Shown { index: 0, .. }));
        assert_eq!(
            *display.shown.lock().unwrap(),
            ["placeholder", "placeholder", "slide_1.png"]
        );
    }

    #[test]
    fn new_cache_restarts_from_first_slide() {
        let dir = tempfile::tempdir().unwrap();
        let (cycler, cache, _) = cycler(dir.path());
        cache.install(1, slides(5)).unwrap();
        for _ in 0..3 {
            cycler.tick();
        }

        cache.install(2, slides(2)).unwrap();
        assert_eq!(
            cycler.tick(),
            TickOutcome::Shown { index: 0, id: SlideId::from_ordinal(1).unwrap() }
        );
    }

    #[test]
    fn emptied_cache_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let (cycler, cache, _) = cycler(dir.path());
        cache.install(1, slides(3)).unwrap();
        cycler.tick();
        cache.install(2, Vec::new()).unwrap();
        assert_eq!(cycler.tick(), TickOutcome::Placeholder);
    }

    #[tokio::test]
    async fn run_ticks_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let (cycler, cache, display) = cycler(dir.path());
        cache.install(1, slides(1)).unwrap();

        let handle = tokio::spawn(cycler.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert!(!display.shown.lock().unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn k_ticks_visit_every_slide_once(k in 1u32..24) {
            let dir = tempfile::tempdir().unwrap();
            let (cycler, cache, _) = cycler(dir.path());
            cache.install(1, slides(k)).unwrap();

            let mut seen: Vec<SlideId> = (0..k)
                .map(|_| match cycler.tick() {
                    TickOutcome::Shown { id, .. } => id,
                    TickOutcome::Placeholder => panic!("placeholder with {k} slides"),
                })
                .collect();
            let first = seen[0];
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), k as usize);
            prop_assert_eq!(cycler.tick(), TickOutcome::Shown { index: 0, id: first });
        }
    }
}
