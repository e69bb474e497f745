//! Branch terminal for slide signage.
//!
//! A branch keeps a local copy of the distribution service's inventory and
//! rotates through it on a fixed interval.
//!
//! - [`SyncAgent`] pulls the full inventory; a sync either replaces the
//!   [`LocalCache`] completely or leaves it untouched
//! - [`SyncTrigger`] runs syncs on a background worker, coalescing bursts of
//!   reload signals
//! - [`DisplayCycler`] shows one slide per tick through a [`Display`]
//! - [`BranchNode`] wires the pieces together behind the `GET /reload`
//!   listener

pub mod agent;
pub mod cache;
pub mod config;
pub mod cycler;
pub mod error;
pub mod listener;
pub mod node;
pub mod source;

#[cfg(test)]
mod test_support;

pub use agent::{SyncAgent, SyncReport, SyncTrigger};
pub use cache::{CacheSnapshot, CachedSlide, LocalCache};
pub use config::BranchConfig;
pub use cycler::{Display, DisplayCycler, LogDisplay, TickOutcome};
pub use error::{SyncError, SyncResult};
pub use listener::{build_branch_router, BranchState};
pub use node::BranchNode;
pub use source::{HttpSlideSource, SlideSource};
