use chrono::{DateTime, Utc};
use signage_types::{Slide, SlideId};

/// One complete, immutable version of the inventory.
#[derive(Clone, Debug)]
pub struct InventorySnapshot {
    version: u64,
    published_at: Option<DateTime<Utc>>,
    slides: Vec<Slide>,
}

impl InventorySnapshot {
    /// The empty inventory a fresh service starts with.
    pub fn empty() -> Self {
        Self { version: 0, published_at: None, slides: Vec::new() }
    }

    /// Build a snapshot; slides are sorted by ordinal.
    pub fn new(version: u64, published_at: DateTime<Utc>, mut slides: Vec<Slide>) -> Self {
        slides.sort_by_key(|s| s.ordinal());
        Self { version, published_at: Some(published_at), slides }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Identifiers in ordinal order.
    pub fn ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(Slide::id).collect()
    }

    pub fn get(&self, id: &SlideId) -> Option<&Slide> {
        self.slides
            .binary_search_by_key(&id.ordinal(), Slide::ordinal)
            .ok()
            .map(|i| &self.slides[i])
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Total image bytes across all slides.
    pub fn total_bytes(&self) -> u64 {
        self.slides.iter().map(|s| s.len() as u64).sum()
    }
}

impl Default for InventorySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(n: u32) -> Slide {
        Slide::new(SlideId::from_ordinal(n).unwrap(), format!("img{n}").into_bytes())
    }

    #[test]
    fn empty_snapshot() {
        let s = InventorySnapshot::empty();
        assert_eq!(s.version(), 0);
        assert!(s.is_empty());
        assert!(s.published_at().is_none());
        assert!(s.ids().is_empty());
    }

    #[test]
    fn slides_are_sorted_by_ordinal() {
        let s = InventorySnapshot::new(1, Utc::now(), vec![slide(10), slide(2), slide(1)]);
        let names: Vec<String> = s.ids().iter().map(|id| id.file_name()).collect();
        assert_eq!(names, ["slide_1.png", "slide_2.png", "slide_10.png"]);
    }

    #[test]
    fn get_by_id() {
        let s = InventorySnapshot::new(1, Utc::now(), vec![slide(1), slide(2), slide(3)]);
        let two = s.get(&SlideId::from_ordinal(2).unwrap()).unwrap();
        assert_eq!(two.data().as_ref(), b"img2");
        assert!(s.get(&SlideId::from_ordinal(4).unwrap()).is_none());
        assert_eq!(s.total_bytes(), 12);
    }
}
