//! Fakes shared by this crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use signage_types::{SlideId, SlideListing};

use crate::error::{SyncError, SyncResult};
use crate::source::SlideSource;

/// An in-memory inventory that can be told to fail or stall.
#[derive(Default)]
pub struct FakeSource {
    inner: Mutex<Inventory>,
    pub lists: AtomicUsize,
}

#[derive(Default)]
struct Inventory {
    version: u64,
    order: Vec<SlideId>,
    slides: HashMap<SlideId, Bytes>,
    failing: HashSet<SlideId>,
    delay: Duration,
}

pub fn id(n: u32) -> SlideId {
    SlideId::from_ordinal(n).unwrap()
}

impl FakeSource {
    /// Publish `n` slides whose bytes are `<tag><ordinal>`.
    pub fn with_slides(tag: &str, n: u32) -> Self {
        let source = Self::default();
        source.publish(tag, n);
        source
    }

    pub fn publish(&self, tag: &str, n: u32) {
        let mut inv = self.inner.lock().unwrap();
        inv.version += 1;
        inv.order = (1..=n).map(id).collect();
        inv.slides = (1..=n)
            .map(|i| (id(i), Bytes::from(format!("{tag}{i}"))))
            .collect();
    }

    pub fn fail_fetch(&self, slide: SlideId) {
        self.inner.lock().unwrap().failing.insert(slide);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = delay;
    }
}

#[async_trait]
impl SlideSource for FakeSource {
    async fn list_slides(&self) -> SyncResult<SlideListing> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let (listing, delay) = {
            let inv = self.inner.lock().unwrap();
            let listing = SlideListing { slides: inv.order.clone(), version: inv.version };
            (listing, inv.delay)
        };
        tokio::time::sleep(delay).await;
        Ok(listing)
    }

    async fn fetch_slide(&self, slide: &SlideId) -> SyncResult<Bytes> {
        let inv = self.inner.lock().unwrap();
        if inv.failing.contains(slide) {
            return Err(SyncError::Transport {
                url: format!("fake://{slide}"),
                reason: "connection reset".into(),
            });
        }
        inv.slides.get(slide).cloned().ok_or(SyncError::Status {
            url: format!("fake://{slide}"),
            status: 404,
        })
    }
}
