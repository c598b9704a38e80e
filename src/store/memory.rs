//! In-memory storage implementation

use super::entry::Entry;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type alias for the key map, hashed with SipHasher
pub type Entries = HashMap<String, Entry, BuildHasherDefault<SipHasher13>>;

/// In-memory key-value store
///
/// A single map guarded by a single reader/writer lock. The lock is taken
/// exclusively for every mutation (put, eviction, sweep, wholesale replace)
/// and shared for read-only traversal. No reference into the map ever
/// escapes this type.
pub struct MemoryStore {
    /// The main storage map
    entries: RwLock<Entries>,

    /// Expired entries physically removed so far (lazily or by a sweep)
    evictions: AtomicU64,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            entries: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            )),
            evictions: AtomicU64::new(0),
        }
    }

    /// Insert or replace the entry for `key`
    ///
    /// Any previous entry is fully replaced, expiration included, even if it
    /// had not expired yet.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let entry = Entry {
            value: value.into(),
            expires_at,
        };

        self.entries.write().insert(key.into(), entry);
    }

    /// Get a value by key, returns None if not found or expired
    ///
    /// An expired entry is removed as a side effect of the lookup.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Utc::now();

        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        self.evict_if_expired(key)
    }

    /// Re-check `key` under the exclusive lock and remove it if expired
    ///
    /// The entry may have been evicted or replaced while no lock was held, so
    /// the clock is read again once the lock is taken.
    fn evict_if_expired(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.write();
        let now = Utc::now();
        match entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }

        entries.remove(key);
        self.evictions.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Get a copy of the raw entry for a key, expired or not
    pub fn get_entry(&self, key: &str) -> Option<Entry> {
        self.entries.read().get(key).cloned()
    }

    /// Check if a key is physically present, expired or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Remove every expired entry in a single pass
    /// Returns the number of keys removed
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();

        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Run `f` over the whole map while holding the shared lock
    pub fn with_entries<R>(&self, f: impl FnOnce(&Entries) -> R) -> R {
        f(&*self.entries.read())
    }

    /// Replace the whole map, returns the number of entries now stored
    pub fn replace_all(&self, entries: Entries) -> usize {
        let mut guard = self.entries.write();
        *guard = entries;
        guard.len()
    }

    /// Number of physically present entries (including expired ones)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store holds no entry at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get statistics about the store
    pub fn stats(&self) -> StoreStats {
        let now = Utc::now();
        let entries = self.entries.read();

        let mut active_keys = 0;
        let mut used_memory_bytes = 0;
        for (key, entry) in entries.iter() {
            if !entry.is_expired_at(now) {
                active_keys += 1;
                used_memory_bytes += key.len() + entry.memory_usage();
            }
        }

        StoreStats {
            total_keys: entries.len(),
            expired_keys: entries.len() - active_keys,
            active_keys,
            used_memory_bytes,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the memory store
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub total_keys: usize,
    pub expired_keys: usize,
    pub active_keys: usize,
    pub used_memory_bytes: usize,
    pub evictions: u64,
}
