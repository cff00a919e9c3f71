//! Snapshot file format and atomic writer
//!
//! ## Layout
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | Magic `MSNP`                           |
//! | 4      | 1    | Format version (1)                     |
//! | 5      | 4    | CRC32 of payload (big-endian)          |
//! | 9      | 8    | Payload length in bytes (big-endian)   |
//! | 17     | n    | MessagePack-encoded [`Snapshot`]       |
//!
//! ## Crash safety
//!
//! 1. Write to a temporary file next to the target
//! 2. fsync the temporary file
//! 3. Atomic rename over the target
//! 4. fsync the parent directory (unix)
//!
//! Either the previous snapshot or the complete new one is visible, never a
//! partial file.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use meshstore_core::{Error, Metadata, MiniHeader, Order, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name used inside a data directory
pub const SNAPSHOT_FILE_NAME: &str = "meshstore.snapshot";

const MAGIC: &[u8; 4] = b"MSNP";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 4 + 8;

/// Materialized content of all three collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Order rows
    pub orders: Vec<Order>,
    /// Mini header rows
    pub mini_headers: Vec<MiniHeader>,
    /// Metadata rows (zero or one)
    pub metadata: Vec<Metadata>,
}

impl Snapshot {
    /// Total number of rows across collections
    pub fn row_count(&self) -> usize {
        self.orders.len() + self.mini_headers.len() + self.metadata.len()
    }
}

fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let payload = rmp_serde::to_vec_named(snapshot)?;
    let checksum = crc32fast::hash(&payload);

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.write_u8(FORMAT_VERSION)?;
    bytes.write_u32::<BigEndian>(checksum)?;
    bytes.write_u64::<BigEndian>(payload.len() as u64)?;
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Corruption(format!(
            "snapshot truncated: {} bytes, header needs {}",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if &bytes[..4] != MAGIC {
        return Err(Error::Corruption("bad snapshot magic".to_string()));
    }

    let mut cursor = Cursor::new(&bytes[4..HEADER_LEN]);
    let version = cursor.read_u8()?;
    if version != FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported snapshot version {}",
            version
        )));
    }
    let expected_crc = cursor.read_u32::<BigEndian>()?;
    let payload_len = cursor.read_u64::<BigEndian>()? as usize;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() != payload_len {
        return Err(Error::Corruption(format!(
            "snapshot payload is {} bytes, header says {}",
            payload.len(),
            payload_len
        )));
    }
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(Error::Corruption(format!(
            "snapshot checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    Ok(rmp_serde::from_slice(payload)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| SNAPSHOT_FILE_NAME.to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write `snapshot` to `path` atomically
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = encode(snapshot)?;
    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            File::open(parent)?.sync_all()?;
        }
    }

    info!(
        path = %path.display(),
        rows = snapshot.row_count(),
        size_bytes = bytes.len(),
        "snapshot written"
    );
    Ok(())
}

/// Read the snapshot at `path`
///
/// Returns `Ok(None)` when no snapshot exists yet.
pub fn read_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no snapshot present, starting empty");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let snapshot = decode(&bytes)?;

    info!(
        path = %path.display(),
        rows = snapshot.row_count(),
        "snapshot loaded"
    );
    Ok(Some(snapshot))
}
