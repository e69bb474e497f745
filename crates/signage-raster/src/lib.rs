//! Rasterization pipeline for slide signage.
//!
//! Turns one uploaded [`Deck`](signage_types::Deck) into an ordered sequence
//! of [`Slide`](signage_types::Slide)s through two chained external
//! conversions:
//!
//! 1. [`DocumentConverter`] -- deck to an intermediate PDF
//! 2. [`PageRasterizer`] -- PDF to one PNG per page
//!
//! Each stage fails with its own [`ConversionStage`] so callers can tell
//! which external dependency broke. The pipeline never publishes anything;
//! it only returns slides or an error.

pub mod command;
pub mod config;
pub mod converter;
pub mod error;
pub mod pipeline;

pub use command::{OfficeConverter, PdfRasterizer};
pub use config::ConverterConfig;
pub use converter::{DocumentConverter, PageRasterizer, PAGE_PREFIX};
pub use error::{ConversionStage, RasterError, RasterResult};
pub use pipeline::RasterPipeline;
