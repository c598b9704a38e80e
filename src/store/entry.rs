//! Entry structure for stored values

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Represents a single value in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The value, never interpreted by the store
    pub value: Bytes,

    /// Optional expiration time (absolute)
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create a new entry without expiration
    pub fn new(value: impl Into<Bytes>) -> Self {
        Entry {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Create a new entry expiring at the given instant
    pub fn with_expiration(value: impl Into<Bytes>, expires_at: DateTime<Utc>) -> Self {
        Entry {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check if the entry is expired at `now`.
    ///
    /// An entry whose expiration equals `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Calculate approximate memory usage of this entry in bytes
    pub fn memory_usage(&self) -> usize {
        self.value.len() + std::mem::size_of::<Option<DateTime<Utc>>>()
    }
}
