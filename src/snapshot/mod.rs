//! Snapshot persistence module
//!
//! Provides best-effort durability by writing the whole store to
//! `<name>.<ext>` and restoring it at startup. Two encodings are supported:
//! a compact binary format protected by a checksum (preferred on load) and a
//! verbose JSON format.

mod binary;
mod json;
mod reader;
mod writer;

pub use reader::load;
pub use writer::save;

use crate::store::Entries;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Snapshot encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnapshotFormat {
    /// Dense binary encoding with an xxh64 checksum
    #[default]
    Binary,
    /// JSON text encoding (slower, roughly twice the memory)
    Json,
}

impl SnapshotFormat {
    /// Order in which snapshot files are looked up on load
    pub const LOAD_ORDER: [SnapshotFormat; 2] = [SnapshotFormat::Binary, SnapshotFormat::Json];

    /// File extension used for this format
    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Binary => "bin",
            SnapshotFormat::Json => "json",
        }
    }

    /// Path of the snapshot file for `name` in this format
    pub fn path(self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}", name, self.extension()))
    }

    pub(crate) fn encode(self, entries: &Entries) -> Result<Vec<u8>, SnapshotError> {
        let encoded = match self {
            SnapshotFormat::Binary => binary::encode(entries),
            SnapshotFormat::Json => json::encode(entries),
        };

        encoded.map_err(|reason| SnapshotError::Encode { format: self, reason })
    }

    pub(crate) fn decode(self, data: &[u8]) -> Result<Entries, SnapshotError> {
        let decoded = match self {
            SnapshotFormat::Binary => binary::decode(data),
            SnapshotFormat::Json => json::decode(data),
        };

        decoded.map_err(|reason| SnapshotError::Decode { format: self, reason })
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SnapshotFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bin" | "binary" => Ok(SnapshotFormat::Binary),
            "json" => Ok(SnapshotFormat::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Returned when parsing an unsupported format name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown snapshot format '{0}', expected 'bin' or 'json'")]
pub struct UnknownFormat(pub String);

/// Errors raised while saving or loading a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("create snapshot file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write snapshot file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("open snapshot file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read snapshot file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{format} encode error: {reason}")]
    Encode { format: SnapshotFormat, reason: String },

    #[error("{format} decode error: {reason}")]
    Decode { format: SnapshotFormat, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("bin".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::Binary);
        assert_eq!("BINARY".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::Binary);
        assert_eq!("json".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::Json);
        assert!("gob".parse::<SnapshotFormat>().is_err());

        assert_eq!(SnapshotFormat::default(), SnapshotFormat::Binary);
        assert_eq!(SnapshotFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(SnapshotFormat::Binary.path("data/cache"), PathBuf::from("data/cache.bin"));
        assert_eq!(SnapshotFormat::Json.path("cache"), PathBuf::from("cache.json"));
    }
}
