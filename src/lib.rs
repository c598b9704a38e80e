//! Persista - an embeddable in-memory key-value store
//!
//! Values live in a single locked map and may carry an absolute expiration.
//! Expired entries are dropped lazily on read or by a background janitor,
//! and the whole map can be snapshotted to disk periodically and on shutdown
//! so that it survives restarts on a best-effort basis.
//!
//! - `store`: the map, its lock and expiration rules
//! - `snapshot`: binary/JSON encodings, save and load with format fallback
//! - `storage`: the public handle and its background tasks
//! - `web`: the HTTP endpoint wired around the storage

pub mod config;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod web;

/// Re-export commonly used types
pub use config::{JanitorConfig, PersistenceConfig, StorageConfig};
pub use snapshot::{SnapshotError, SnapshotFormat};
pub use storage::Storage;
pub use store::{Entry, MemoryStore, StoreStats};
