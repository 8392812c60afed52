// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Snapshot files.
//!
//! # File Format
//! ```text
//! [magic "RLSN"][version u32][event_index u64][timestamp u64]
//! [state_hash 32 bytes][log_hash 32 bytes][body_crc64 u64][body]
//! ```
//! `event_index` is the id of the last log entry folded into the body.
//! `log_hash` is the BLAKE3 hash of the raw log bytes of entries
//! `1..=event_index`, which ties the snapshot to one particular log.
//! Snapshots are a cache: recovery discards one that fails to verify.

use crate::error::{PersistenceError, Result};
use crate::wal;
use byteorder::{LittleEndian, ReadBytesExt};
use crc64fast::Digest;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use rootledger_kernel::verify::event_log_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub event_index: u64,
    pub timestamp: u64,
    pub state_hash: [u8; 32],
    pub log_hash: [u8; 32],
    pub body_crc64: u64,
}

impl SnapshotHeader {
    pub const SIZE: usize = 4 + 4 + 8 + 8 + 32 + 32 + 8; // 96 bytes
    pub const MAGIC: [u8; 4] = *b"RLSN";
    pub const VERSION: u32 = 2;

    pub fn new(
        event_index: u64,
        timestamp: u64,
        state_hash: [u8; 32],
        log_hash: [u8; 32],
        body: &[u8],
    ) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            event_index,
            timestamp,
            state_hash,
            log_hash,
            body_crc64: body_checksum(body),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..16].copy_from_slice(&self.event_index.to_le_bytes());
        buf[16..24].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[24..56].copy_from_slice(&self.state_hash);
        buf[56..88].copy_from_slice(&self.log_hash);
        buf[88..96].copy_from_slice(&self.body_crc64.to_le_bytes());
        buf
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        let event_index = reader.read_u64::<LittleEndian>()?;
        let timestamp = reader.read_u64::<LittleEndian>()?;
        let mut state_hash = [0u8; 32];
        reader.read_exact(&mut state_hash)?;
        let mut log_hash = [0u8; 32];
        reader.read_exact(&mut log_hash)?;
        let body_crc64 = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            event_index,
            timestamp,
            state_hash,
            log_hash,
            body_crc64,
        })
    }
}

pub fn body_checksum(body: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(body);
    digest.sum64()
}

/// Hash of the first `event_index` entries of the log at `log_path`.
pub fn log_prefix_hash(log_path: impl AsRef<Path>, event_index: u64) -> Result<[u8; 32]> {
    Ok(event_log_hash(&wal::read_prefix(log_path, event_index)?))
}

/// Writes the snapshot to a sibling temp file, fsyncs, then renames over `path`.
pub fn write_to(path: impl AsRef<Path>, header: &SnapshotHeader, body: &[u8]) -> Result<u64> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&header.to_bytes())?;
        file.write_all(body)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok((SnapshotHeader::SIZE + body.len()) as u64)
}

pub fn read_header(path: impl AsRef<Path>) -> Result<SnapshotHeader> {
    let file = File::open(path)?;
    SnapshotHeader::read_from(file)
}

/// Reads header and body, verifying the body checksum.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<(SnapshotHeader, Vec<u8>)> {
    let mut file = File::open(path)?;
    let header = SnapshotHeader::read_from(&mut file)?;
    let mut body = Vec::new();
    file.read_to_end(&mut body)?;

    let found = body_checksum(&body);
    if found != header.body_crc64 {
        return Err(PersistenceError::ChecksumMismatch {
            expected: header.body_crc64,
            found,
        });
    }
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_header_bytes() {
        let header = SnapshotHeader::new(100, 1234567890, [0xAA; 32], [0xBB; 32], b"body");
        let bytes = header.to_bytes();

        let decoded = SnapshotHeader::read_from(&bytes[..]).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = [0u8; SnapshotHeader::SIZE];
        bytes[0..4].copy_from_slice(b"BADM");
        let result = SnapshotHeader::read_from(&bytes[..]);
        assert!(matches!(result, Err(PersistenceError::InvalidMagic)));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.snap");
        let body = b"registry body".to_vec();
        let header = SnapshotHeader::new(7, 42, [1; 32], [2; 32], &body);

        let written = write_to(&path, &header, &body).unwrap();
        assert_eq!(written, (SnapshotHeader::SIZE + body.len()) as u64);
        assert!(!path.with_extension("tmp").exists());

        let (read_header, read_body) = read_snapshot(&path).unwrap();
        assert_eq!(read_header, header);
        assert_eq!(read_body, body);
    }

    #[test]
    fn test_log_prefix_hash_tracks_log_contents() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        let mut wa = wal::WalWriter::open(&a).unwrap();
        let mut wb = wal::WalWriter::open(&b).unwrap();
        wa.append(b"genesis").unwrap();
        wb.append(b"genesis").unwrap();
        wa.append(b"alice").unwrap();
        wb.append(b"bob").unwrap();
        wa.append(b"tail").unwrap();

        assert_eq!(log_prefix_hash(&a, 1).unwrap(), log_prefix_hash(&b, 1).unwrap());
        assert_ne!(log_prefix_hash(&a, 2).unwrap(), log_prefix_hash(&b, 2).unwrap());
        assert_eq!(
            log_prefix_hash(&a, 3).unwrap(),
            event_log_hash(&fs::read(&a).unwrap())
        );
    }

    #[test]
    fn test_body_corruption_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.snap");
        let body = b"registry body".to_vec();
        let header = SnapshotHeader::new(7, 42, [1; 32], [2; 32], &body);
        write_to(&path, &header, &body).unwrap();

        let mut raw = fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        fs::write(&path, raw).unwrap();

        assert!(matches!(read_snapshot(&path), Err(PersistenceError::ChecksumMismatch { .. })));
    }
}
