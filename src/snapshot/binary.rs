//! Binary snapshot format
//!
//! Layout (little endian):
//! [magic "PSNP"] [version(u8)] [count(u32)]
//! count x ([key_len(u32)] [key] [value_len(u32)] [value] [has_expiry(u8)] [secs(i64) nanos(u32)]?)
//! [checksum(u64)]
//!
//! The checksum is the xxhash64 of every byte before it.

use crate::store::{Entries, Entry};
use bytes::Bytes;
use chrono::DateTime;

const MAGIC: &[u8; 4] = b"PSNP";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4;
const CHECKSUM_LEN: usize = 8;

/// Serialize every entry, followed by the checksum
pub(super) fn encode(entries: &Entries) -> Result<Vec<u8>, String> {
    let mut buf = Vec::with_capacity(HEADER_LEN + CHECKSUM_LEN + entries.len() * 32);

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&length(entries.len(), "entry count")?.to_le_bytes());

    for (key, entry) in entries {
        put_chunk(&mut buf, key.as_bytes(), "key")?;
        put_chunk(&mut buf, &entry.value, "value")?;

        match entry.expires_at {
            Some(at) => {
                buf.push(1);
                buf.extend_from_slice(&at.timestamp().to_le_bytes());
                buf.extend_from_slice(&at.timestamp_subsec_nanos().to_le_bytes());
            }
            None => buf.push(0),
        }
    }

    let checksum = xxhash_rust::xxh64::xxh64(&buf, 0);
    buf.extend_from_slice(&checksum.to_le_bytes());

    Ok(buf)
}

/// Deserialize a snapshot, verifying its checksum first
pub(super) fn decode(data: &[u8]) -> Result<Entries, String> {
    if data.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err("Insufficient data".to_string());
    }

    let (body, trailer) = data.split_at(data.len() - CHECKSUM_LEN);
    let stored_checksum = u64::from_le_bytes(trailer.try_into().map_err(|_| "Invalid checksum")?);
    let calculated_checksum = xxhash_rust::xxh64::xxh64(body, 0);
    if stored_checksum != calculated_checksum {
        return Err(format!(
            "Checksum mismatch: expected {}, got {}",
            stored_checksum, calculated_checksum
        ));
    }

    let mut reader = Reader { data: body, pos: 0 };

    if reader.take(MAGIC.len())? != MAGIC {
        return Err("Invalid magic".to_string());
    }

    let version = reader.u8()?;
    if version != VERSION {
        return Err(format!("Unsupported version {}", version));
    }

    let count = reader.u32()? as usize;
    let mut entries = Entries::default();
    // Never trust the count for the allocation size
    entries.reserve(count.min(body.len() / 9));

    for _ in 0..count {
        let key_len = reader.u32()? as usize;
        let key = std::str::from_utf8(reader.take(key_len)?)
            .map_err(|_| "Invalid UTF-8 key")?
            .to_string();

        let value_len = reader.u32()? as usize;
        let value = Bytes::copy_from_slice(reader.take(value_len)?);

        let expires_at = match reader.u8()? {
            0 => None,
            1 => {
                let secs = reader.i64()?;
                let nanos = reader.u32()?;
                Some(DateTime::from_timestamp(secs, nanos).ok_or("Invalid expiration time")?)
            }
            flag => return Err(format!("Invalid expiration flag {}", flag)),
        };

        entries.insert(key, Entry { value, expires_at });
    }

    if reader.pos != body.len() {
        return Err(format!("{} trailing bytes after last entry", body.len() - reader.pos));
    }

    Ok(entries)
}

fn length(len: usize, what: &str) -> Result<u32, String> {
    u32::try_from(len).map_err(|_| format!("{} too large: {}", what, len))
}

fn put_chunk(buf: &mut Vec<u8>, chunk: &[u8], what: &str) -> Result<(), String> {
    buf.extend_from_slice(&length(chunk.len(), what)?.to_le_bytes());
    buf.extend_from_slice(chunk);
    Ok(())
}

/// Bounds-checked cursor over the snapshot body
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| format!("Unexpected end of data at position {}", self.pos))?;

        let chunk = &self.data[self.pos..end];
        self.pos = end;
        Ok(chunk)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, String> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().map_err(|_| "Invalid u32")?))
    }

    fn i64(&mut self) -> Result<i64, String> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().map_err(|_| "Invalid i64")?))
    }
}
