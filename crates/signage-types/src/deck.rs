use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

const FALLBACK_NAME: &str = "deck.pptx";

/// An uploaded presentation awaiting rasterization.
#[derive(Clone)]
pub struct Deck {
    filename: String,
    data: Bytes,
    submitted_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            submitted_at: Utc::now(),
        }
    }

    /// The file name exactly as the uploader sent it.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// A file name that is safe to join onto a scratch directory.
    ///
    /// Any directory components are dropped and characters outside
    /// `[A-Za-z0-9._-]` become `_`. Leading dots are stripped so the result
    /// can never be hidden or refer to a parent directory.
    pub fn safe_file_name(&self) -> String {
        let base = self
            .filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// The safe file name without its extension.
    pub fn stem(&self) -> String {
        let name = self.safe_file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        }
    }
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck")
            .field("filename", &self.filename)
            .field("bytes", &self.data.len())
            .field("submitted_at", &self.submitted_at)
            .finish()
    }
}
