use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid slide identifier: {0}")]
    InvalidSlideId(String),

    #[error("slide ordinals start at 1")]
    ZeroOrdinal,
}
