//! # Larder Store
//!
//! Local persistence boundary and mutation tracking for Larder sync.
//!
//! This crate provides:
//! - The [`LocalStore`] capability consumed by the sync engine
//! - [`MemoryStore`] for tests and ephemeral sessions
//! - [`JsonFileStore`] for durable on-disk persistence
//! - [`MutationLog`], the per-collection dirty tracking that feeds the
//!   "data changed" signal
//!
//! ## Key Invariants
//!
//! - Values are JSON-encoded strings; callers parse at their boundary
//! - A collection's full record array lives under [`RECORDS_KEY`]
//! - The [`SYNC_NAMESPACE`] namespace is reserved for sync bookkeeping

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod mutation_log;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use mutation_log::MutationLog;
pub use store::{LocalStore, RECORDS_KEY, SYNC_NAMESPACE};
