//! In-memory storage module
//!
//! Provides the core data structures for storing key-value pairs in memory.
//! This module knows nothing about snapshots, timers or HTTP (loose coupling).

mod entry;
mod memory;

pub use entry::Entry;
pub use memory::{Entries, MemoryStore, StoreStats};
