//! Storage handle
//!
//! Ties the in-memory store to its optional background tasks (janitor and
//! saver) and to the snapshot loaded at startup.

mod janitor;
mod lifecycle;
mod saver;

use crate::config::StorageConfig;
use crate::snapshot;
use crate::store::{MemoryStore, StoreStats};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lifecycle::Lifecycle;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// An in-memory key-value storage with optional expiration sweeping and
/// snapshots
///
/// # Example
///
/// ```rust,no_run
/// use persista::{PersistenceConfig, Storage, StorageConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo() {
/// let cancel = CancellationToken::new();
/// let storage = Storage::new(
///     cancel.clone(),
///     StorageConfig::default().with_persistence(PersistenceConfig::default()),
/// );
///
/// storage.put("test", r#"{"key": "value"}"#, None);
/// assert!(storage.get("test").is_some());
///
/// cancel.cancel();
/// storage.shutdown().await;
/// # }
/// ```
pub struct Storage {
    store: Arc<MemoryStore>,
    lifecycle: Lifecycle,
}

impl Storage {
    /// Create a storage bound to `cancel`
    ///
    /// With persistence enabled, the previous snapshot is loaded before this
    /// returns. A snapshot that cannot be read is logged and the storage
    /// starts empty. Must be called from within a tokio runtime as soon as a
    /// background task is enabled.
    pub fn new(cancel: CancellationToken, config: StorageConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = Lifecycle::new(cancel);

        if let Some(persistence) = &config.persistence {
            let settings = persistence.resolve();

            match snapshot::load(&store, &settings.name) {
                Ok(count) => info!("Loaded {} entries from {}", count, settings.name),
                Err(e) => error!("Failed to load snapshot {}, starting empty: {}", settings.name, e),
            }

            info!(
                "Persistence to {} enabled in {} format every {:?}",
                settings.name, settings.format, settings.interval
            );
            lifecycle.spawn("saver", saver::run(store.clone(), settings, lifecycle.token()));
        }

        if let Some(janitor) = &config.janitor {
            let settings = janitor.resolve();

            info!("Janitor enabled, sweeping every {:?}", settings.interval);
            lifecycle.spawn(
                "janitor",
                janitor::run(store.clone(), settings.interval, lifecycle.token()),
            );
        }

        Storage { store, lifecycle }
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.store.put(key, value, expires_at);
    }

    /// Get the value stored under `key`, if present and not expired
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.store.get(key)
    }

    /// Get statistics about the stored entries
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Wait until the background tasks have stopped
    ///
    /// Resolves once the cancellation token given to [`Storage::new`] has
    /// fired and the saver has written its final snapshot. There is no
    /// timeout: callers that need a bound must impose one themselves.
    pub async fn shutdown(&self) {
        debug!("Waiting for {} background tasks", self.lifecycle.running());
        self.lifecycle.shutdown().await;
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &MemoryStore {
        &self.store
    }
}
