//! Snapshot writer
//!
//! Handles writing the whole store to its snapshot file.

use super::{SnapshotError, SnapshotFormat};
use crate::store::MemoryStore;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Save every entry of `store` to `<name>.<ext>`
///
/// Expired entries are written too. The map is encoded under the shared
/// lock, then written to a temporary file that replaces the previous
/// snapshot in a single rename. Returns the number of entries written.
pub fn save(store: &MemoryStore, name: &str, format: SnapshotFormat) -> Result<usize, SnapshotError> {
    let path = format.path(name);

    let (count, data) = store.with_entries(|entries| {
        format.encode(entries).map(|data| (entries.len(), data))
    })?;

    write_atomically(&path, &data)?;
    debug!("Wrote {} bytes to {}", data.len(), path.display());

    Ok(count)
}

fn write_atomically(path: &Path, data: &[u8]) -> Result<(), SnapshotError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_error = |source: io::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|source| SnapshotError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    file.write_all(data).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
