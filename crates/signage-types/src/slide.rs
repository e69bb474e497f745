use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const PREFIX: &str = "slide_";
const EXTENSION: &str = ".png";

/// Stable identifier of a slide, derived from its 1-based ordinal.
///
/// The textual form is always `slide_<n>.png`. Parsing is strict: no path
/// separators, no leading zeros, no other extensions. Ordering follows the
/// embedded ordinal, so `slide_10.png` sorts after `slide_9.png`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlideId(u32);

impl SlideId {
    /// Identifier for the given 1-based ordinal.
    pub fn from_ordinal(ordinal: u32) -> Result<Self, TypeError> {
        if ordinal == 0 {
            return Err(TypeError::ZeroOrdinal);
        }
        Ok(Self(ordinal))
    }

    /// The 1-based position of this slide in the deck.
    pub fn ordinal(&self) -> u32 {
        self.0
    }

    /// The file name used on disk and over HTTP.
    pub fn file_name(&self) -> String {
        format!("{PREFIX}{}{EXTENSION}", self.0)
    }
}

impl FromStr for SlideId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(EXTENSION))
            .ok_or_else(|| TypeError::InvalidSlideId(s.to_string()))?;

        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !digits.starts_with('0');
        if !canonical {
            return Err(TypeError::InvalidSlideId(s.to_string()));
        }

        let ordinal = digits
            .parse::<u32>()
            .map_err(|_| TypeError::InvalidSlideId(s.to_string()))?;
        Self::from_ordinal(ordinal)
    }
}

impl TryFrom<String> for SlideId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlideId> for String {
    fn from(id: SlideId) -> Self {
        id.file_name()
    }
}

impl fmt::Debug for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlideId({})", self.0)
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}{EXTENSION}", self.0)
    }
}

/// One rasterized page of a deck.
///
/// Slides are immutable once produced. The image bytes are reference-counted
/// so snapshots can share them without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct Slide {
    id: SlideId,
    data: Bytes,
    digest: String,
}

impl Slide {
    pub fn new(id: SlideId, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let digest = hex::encode(blake3::hash(&data).as_bytes());
        Self { id, data, digest }
    }

    pub fn id(&self) -> SlideId {
        self.id
    }

    pub fn ordinal(&self) -> u32 {
        self.id.ordinal()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Hex-encoded BLAKE3 digest of the image bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Slide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slide")
            .field("id", &self.id)
            .field("bytes", &self.data.len())
            .field("digest", &&self.digest[..8])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn file_name_from_ordinal() {
        let id = SlideId::from_ordinal(3).unwrap();
        assert_eq!(id.file_name(), "slide_3.png");
        assert_eq!(id.to_string(), "slide_3.png");
    }

    #[test]
    fn zero_ordinal_rejected() {
        assert_eq!(SlideId::from_ordinal(0), Err(TypeError::ZeroOrdinal));
        assert!("slide_0.png".parse::<SlideId>().is_err());
    }

    #[test]
    fn parse_rejects_non_canonical_names() {
        for bad in [
            "slide_01.png",
            "slide_.png",
            "slide_1.jpg",
            "Slide_1.png",
            "../slide_1.png",
            "slide_1.png/..",
            "slide_+1.png",
            "slide_1a.png",
            "slide_99999999999.png",
        ] {
            assert!(bad.parse::<SlideId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn ordering_follows_ordinal_not_text() {
        let mut ids: Vec<SlideId> = ["slide_10.png", "slide_2.png", "slide_1.png"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        let names: Vec<String> = ids.iter().map(|id| id.file_name()).collect();
        assert_eq!(names, ["slide_1.png", "slide_2.png", "slide_10.png"]);
    }

    #[test]
    fn serde_uses_file_name() {
        let id = SlideId::from_ordinal(7).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"slide_7.png\"");
        let back: SlideId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<SlideId>("\"evil/../x\"").is_err());
    }

    #[test]
    fn slide_digest_is_content_hash() {
        let id = SlideId::from_ordinal(1).unwrap();
        let a = Slide::new(id, b"page one".to_vec());
        let b = Slide::new(id, b"page one".to_vec());
        let c = Slide::new(id, b"page two".to_vec());
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
        assert_eq!(a.len(), 8);
    }

    proptest! {
        #[test]
        fn file_name_parses_back(ordinal in 1u32..) {
            let id = SlideId::from_ordinal(ordinal).unwrap();
            let parsed: SlideId = id.file_name().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
