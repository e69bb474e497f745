//! Distribution service for slide signage.
//!
//! Accepts uploaded decks over HTTP, rasterizes them through
//! [`signage_raster`], publishes the slides into a [`signage_store`]
//! inventory, and fans a reload signal out to the configured branches.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod service;

#[cfg(test)]
mod test_support;

pub use broadcast::{BranchNotifier, BroadcastReport, Broadcaster, HttpNotifier};
pub use config::ServerConfig;
pub use error::{BroadcastError, ServerError, ServerResult};
pub use router::build_router;
pub use server::SignageServer;
pub use service::{DistributionService, SubmitOutcome};
