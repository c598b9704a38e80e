//! Snapshot reader
//!
//! Handles restoring the store from a snapshot file at startup.

use super::{SnapshotError, SnapshotFormat};
use crate::store::MemoryStore;
use std::fs::File;
use std::io::{self, Read};
use tracing::{debug, info};

/// Load the snapshot for `name` into `store`
///
/// Formats are tried in [`SnapshotFormat::LOAD_ORDER`]: a missing file moves
/// on to the next format, and when no file exists at all the store is left
/// untouched and `Ok(0)` is returned. The first file found replaces the whole
/// map; any error opening, reading or decoding it is returned without trying
/// further formats. Expired entries are loaded as they are.
pub fn load(store: &MemoryStore, name: &str) -> Result<usize, SnapshotError> {
    for format in SnapshotFormat::LOAD_ORDER {
        let path = format.path(name);

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No {} snapshot at {}", format, path.display());
                continue;
            }
            Err(source) => return Err(SnapshotError::Open { path, source }),
        };

        let mut data = Vec::new();
        if let Err(source) = file.read_to_end(&mut data) {
            return Err(SnapshotError::Read { path, source });
        }

        let entries = format.decode(&data)?;
        let count = store.replace_all(entries);
        info!("Snapshot {} restored: {} entries", path.display(), count);

        return Ok(count);
    }

    debug!("No snapshot found for {}, starting empty", name);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::save;
    use bytes::Bytes;
    use chrono::{Duration, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn name_in(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_save_and_load_both_formats() {
        for format in [SnapshotFormat::Binary, SnapshotFormat::Json] {
            let dir = TempDir::new().unwrap();
            let name = name_in(&dir, "filename");
            let data = Bytes::from_static(br#"{"key": "value"}"#);
            let expires = Utc::now() + Duration::hours(24);

            let store = MemoryStore::new();
            store.put("test", data.clone(), Some(expires));
            store.put("forever", vec![0u8, 255, 7], None);
            assert_eq!(save(&store, &name, format).unwrap(), 2);

            let loaded = MemoryStore::new();
            assert_eq!(load(&loaded, &name).unwrap(), 2, "format {}", format);

            let entry = loaded.get_entry("test").unwrap();
            assert_eq!(entry.value, data);
            let drift = entry.expires_at.unwrap() - expires;
            assert!(drift.num_milliseconds().abs() < 1000);

            let forever = loaded.get_entry("forever").unwrap();
            assert_eq!(forever.value, Bytes::from(vec![0u8, 255, 7]));
            assert_eq!(forever.expires_at, None);
        }
    }

    #[test]
    fn test_load_without_files_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();

        assert_eq!(load(&store, &name_in(&dir, "nothing")).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_falls_back_to_json() {
        let dir = TempDir::new().unwrap();
        let name = name_in(&dir, "fallback");

        let store = MemoryStore::new();
        store.put("k", "from-json", None);
        save(&store, &name, SnapshotFormat::Json).unwrap();

        let loaded = MemoryStore::new();
        assert_eq!(load(&loaded, &name).unwrap(), 1);
        assert_eq!(loaded.get("k"), Some(Bytes::from("from-json")));
    }

    #[test]
    fn test_load_capitalized_json_document() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("go-persista.json"),
            br#"{"test":{"Data":"eyJrZXkiOiAidmFsdWUifQ==","Expires":"2099-01-01T00:00:00Z"},"forever":{"Data":"AP8H","Expires":null}}"#,
        )
        .unwrap();

        let loaded = MemoryStore::new();
        assert_eq!(load(&loaded, &name_in(&dir, "go-persista")).unwrap(), 2);
        assert_eq!(loaded.get("test"), Some(Bytes::from_static(br#"{"key": "value"}"#)));
        assert_eq!(loaded.get("forever"), Some(Bytes::from(vec![0u8, 255, 7])));
        assert_eq!(loaded.get_entry("forever").unwrap().expires_at, None);
    }

    #[test]
    fn test_load_prefers_binary() {
        let dir = TempDir::new().unwrap();
        let name = name_in(&dir, "both");

        let json_store = MemoryStore::new();
        json_store.put("k", "from-json", None);
        save(&json_store, &name, SnapshotFormat::Json).unwrap();

        let binary_store = MemoryStore::new();
        binary_store.put("k", "from-binary", None);
        save(&binary_store, &name, SnapshotFormat::Binary).unwrap();

        let loaded = MemoryStore::new();
        load(&loaded, &name).unwrap();
        assert_eq!(loaded.get("k"), Some(Bytes::from("from-binary")));
    }

    #[test]
    fn test_corrupt_binary_does_not_fall_back() {
        let dir = TempDir::new().unwrap();
        let name = name_in(&dir, "corrupt");

        let store = MemoryStore::new();
        store.put("k", "v", None);
        save(&store, &name, SnapshotFormat::Json).unwrap();
        fs::write(dir.path().join("corrupt.bin"), b"definitely not a snapshot").unwrap();

        let loaded = MemoryStore::new();
        let err = load(&loaded, &name).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Decode { format: SnapshotFormat::Binary, .. }
        ));
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_keeps_expired_entries() {
        let dir = TempDir::new().unwrap();
        let name = name_in(&dir, "stale");

        let store = MemoryStore::new();
        store.put("stale", "v", Some(Utc::now() - Duration::seconds(10)));
        save(&store, &name, SnapshotFormat::Binary).unwrap();

        let loaded = MemoryStore::new();
        assert_eq!(load(&loaded, &name).unwrap(), 1);
        assert!(loaded.contains_key("stale"));
        assert_eq!(loaded.get("stale"), None);
    }
}

/// Property-based tests for snapshot round trips.
#[cfg(test)]
mod proptests {
    use super::*;
    use crate::snapshot::save;
    use crate::store::Entry;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn expiry_strategy() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        prop::option::of((0i64..4_102_444_800, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
            Utc.timestamp_opt(secs, nanos).unwrap()
        }))
    }

    fn entries_strategy() -> impl Strategy<Value = HashMap<String, Entry>> {
        prop::collection::hash_map(
            ".{0,24}",
            (prop::collection::vec(any::<u8>(), 0..256), expiry_strategy()).prop_map(
                |(value, expires_at)| Entry {
                    value: value.into(),
                    expires_at,
                },
            ),
            0..16,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: whatever is saved is loaded back unchanged, in either format.
        #[test]
        fn save_then_load_restores_every_entry(entries in entries_strategy()) {
            for format in [SnapshotFormat::Binary, SnapshotFormat::Json] {
                let dir = TempDir::new().unwrap();
                let name = dir.path().join("prop").to_string_lossy().into_owned();

                let store = MemoryStore::new();
                for (key, entry) in &entries {
                    store.put(key.clone(), entry.value.clone(), entry.expires_at);
                }
                prop_assert_eq!(save(&store, &name, format).unwrap(), entries.len());

                let loaded = MemoryStore::new();
                prop_assert_eq!(load(&loaded, &name).unwrap(), entries.len());
                for (key, entry) in &entries {
                    let got = loaded.get_entry(key);
                    prop_assert_eq!(got.as_ref(), Some(entry), "format {}", format);
                }
            }
        }
    }
}
