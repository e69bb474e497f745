//! Foundation types for slide signage.
//!
//! Every other signage crate depends on `signage-types`. The types here are
//! shared between the distribution service and the branch terminals.
//!
//! # Key Types
//!
//! - [`Deck`] -- an uploaded presentation awaiting rasterization
//! - [`Slide`] -- one rasterized page, immutable once produced
//! - [`SlideId`] -- the stable `slide_<n>.png` identifier derived from an ordinal
//! - [`SlideListing`] -- the `GET /slides` response body

pub mod api;
pub mod deck;
pub mod error;
pub mod slide;

pub use api::{
    endpoints, BranchStatus, ErrorResponse, HealthResponse, MessageResponse, SlideListing,
    UploadResponse,
};
pub use deck::Deck;
pub use error::TypeError;
pub use slide::{Slide, SlideId};
