//! Slide inventory for slide signage.
//!
//! The inventory is the authoritative, ordered list of slides the
//! distribution service currently serves. It is held as an immutable
//! [`InventorySnapshot`] behind a reference that [`SlideInventory::publish`]
//! swaps in one step, so readers always see a complete snapshot.
//!
//! # Storage
//!
//! - [`SlideInventory::in_memory`] -- no persistence, for tests and embedding
//! - [`SlideInventory::open`] -- backed by [`DiskBacking`], reloaded on restart
//!
//! # Design Rules
//!
//! 1. Snapshots are immutable once published.
//! 2. Write-then-swap: a new generation is fully on disk before it becomes current.
//! 3. Reads never block on a publish in progress.
//! 4. The filesystem is a persistence backing, not the source of truth for reads.

pub mod backing;
pub mod error;
pub mod inventory;
pub mod snapshot;

pub use backing::DiskBacking;
pub use error::{StoreError, StoreResult};
pub use inventory::SlideInventory;
pub use snapshot::InventorySnapshot;
