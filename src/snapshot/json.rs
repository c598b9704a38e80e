//! JSON snapshot format
//!
//! `{"<key>": {"Data": "<base64>", "Expires": "<rfc3339>" | null}, ...}`
//!
//! Lowercase field names are accepted on decode.

use crate::store::{Entries, Entry};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Serialize, Deserialize)]
struct JsonEntry {
    #[serde(rename = "Data", alias = "data")]
    data: String,
    #[serde(rename = "Expires", alias = "expires")]
    expires: Option<DateTime<Utc>>,
}

pub(super) fn encode(entries: &Entries) -> Result<Vec<u8>, String> {
    // Sorted keys keep successive snapshots diffable
    let document: BTreeMap<&str, JsonEntry> = entries
        .iter()
        .map(|(key, entry)| {
            let record = JsonEntry {
                data: STANDARD.encode(&entry.value),
                expires: entry.expires_at,
            };
            (key.as_str(), record)
        })
        .collect();

    serde_json::to_vec(&document).map_err(|e| e.to_string())
}

pub(super) fn decode(data: &[u8]) -> Result<Entries, String> {
    let document: HashMap<String, JsonEntry> =
        serde_json::from_slice(data).map_err(|e| e.to_string())?;

    let mut entries = Entries::default();
    entries.reserve(document.len());

    for (key, record) in document {
        let value = STANDARD
            .decode(record.data.as_bytes())
            .map_err(|e| format!("invalid base64 value for key '{}': {}", key, e))?;

        entries.insert(
            key,
            Entry {
                value: Bytes::from(value),
                expires_at: record.expires,
            },
        );
    }

    Ok(entries)
}
