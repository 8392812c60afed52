// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Checksummed write-ahead log.
//!
//! # Entry Format
//! ```text
//! [event_id: u64 LE][payload_len: u32 LE][crc64: u64 LE][payload]
//! ```
//! The CRC64 covers `event_id`, `payload_len` and `payload`. Event ids start
//! at 1 and increase by exactly one per entry; a reader treats any other id
//! as corruption. Every append is `sync_data`'d before it returns; a failed
//! append is truncated away so the file never keeps a torn or orphaned entry.

use crate::error::{PersistenceError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use crc64fast::Digest;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntryHeader {
    pub event_id: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl WalEntryHeader {
    pub const SIZE: usize = 8 + 4 + 8; // 20 bytes

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let event_id = reader.read_u64::<LittleEndian>()?;
        let payload_len = reader.read_u32::<LittleEndian>()?;
        let checksum = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            event_id,
            payload_len,
            checksum,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.event_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.payload_len.to_le_bytes());
        buf[12..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    pub header: WalEntryHeader,
    pub payload: Vec<u8>,
}

impl WalEntry {
    pub fn event_id(&self) -> u64 {
        self.header.event_id
    }
}

/// Largest payload a single entry may carry.
pub const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

pub fn entry_checksum(event_id: u64, payload: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(&event_id.to_le_bytes());
    digest.write(&(payload.len() as u32).to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

fn encode_entry(event_id: u64, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN as usize {
        return Err(PersistenceError::InvalidFormat(format!(
            "payload of {} bytes exceeds entry limit",
            payload.len()
        )));
    }
    let header = WalEntryHeader {
        event_id,
        payload_len: payload.len() as u32,
        checksum: entry_checksum(event_id, payload),
    };
    let mut buf = Vec::with_capacity(WalEntryHeader::SIZE + payload.len());
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Appends a single entry to `path` without sequence tracking.
///
/// Prefer [`WalWriter`], which knows the next id.
pub fn append_entry(path: impl AsRef<Path>, event_id: u64, payload: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    file.write_all(&encode_entry(event_id, payload)?)?;
    file.sync_data()?;

    Ok(())
}

/// Append-only writer that owns the id sequence.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    next_event_id: u64,
    poisoned: bool,
}

impl WalWriter {
    /// Opens or creates the log at `path`.
    ///
    /// An existing log is scanned end to end first; a checksum failure, a
    /// sequence gap or a torn tail refuses the open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut last_event_id = 0;
        if path.exists() {
            for entry in WalReader::new(&path)? {
                last_event_id = entry?.event_id();
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            path,
            file,
            next_event_id: last_event_id + 1,
            poisoned: false,
        })
    }

    /// Appends `payload`, fsyncs, and returns the id it was stored under.
    ///
    /// On failure the file is cut back to its previous length. If that cut
    /// fails too, the writer is poisoned and refuses every later append.
    pub fn append(&mut self, payload: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(PersistenceError::Poisoned);
        }
        let event_id = self.next_event_id;
        let entry = encode_entry(event_id, payload)?;
        let start = self.file.metadata()?.len();

        if let Err(e) = self.write_synced(&entry) {
            self.rollback(start);
            return Err(e);
        }
        self.next_event_id += 1;
        Ok(event_id)
    }

    fn write_synced(&mut self, entry: &[u8]) -> Result<()> {
        self.file.write_all(entry)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn rollback(&mut self, len: u64) {
        let restored = self.file.set_len(len).and_then(|_| self.file.sync_data());
        if restored.is_err() {
            self.poisoned = true;
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of entries in the log.
    pub fn entry_count(&self) -> u64 {
        self.next_event_id - 1
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Streaming reader that validates checksums and id sequence as it goes.
pub struct WalReader {
    reader: BufReader<File>,
    offset: u64,
    expected_id: u64,
    failed: bool,
}

impl WalReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            expected_id: 1,
            failed: false,
        })
    }

    /// Byte offset of the next unread entry.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fills `buf` completely. `Ok(false)` on a clean EOF before the first byte.
    fn fill(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut read = 0;
        while read < buf.len() {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) if read == 0 => return Ok(false),
                Ok(0) => return Err(PersistenceError::Truncated { offset: self.offset }),
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    fn read_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header_buf = [0u8; WalEntryHeader::SIZE];
        if !self.fill(&mut header_buf)? {
            return Ok(None);
        }
        let header = WalEntryHeader::read_from(&header_buf[..])?;
        if header.payload_len > MAX_PAYLOAD_LEN {
            return Err(PersistenceError::InvalidFormat(format!(
                "entry at byte offset {} claims {} payload bytes",
                self.offset, header.payload_len
            )));
        }

        let mut payload = vec![0u8; header.payload_len as usize];
        if !payload.is_empty() && !self.fill(&mut payload)? {
            return Err(PersistenceError::Truncated { offset: self.offset });
        }

        let found = entry_checksum(header.event_id, &payload);
        if found != header.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                expected: header.checksum,
                found,
            });
        }
        if header.event_id != self.expected_id {
            return Err(PersistenceError::SequenceGap {
                expected: self.expected_id,
                found: header.event_id,
            });
        }

        self.offset += (WalEntryHeader::SIZE + payload.len()) as u64;
        self.expected_id += 1;
        Ok(Some(WalEntry { header, payload }))
    }
}

impl Iterator for WalReader {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

pub fn read_stream(path: impl AsRef<Path>) -> Result<WalReader> {
    WalReader::new(path)
}

/// Reads and validates every entry in the log.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<WalEntry>> {
    WalReader::new(path)?.collect()
}

/// Raw bytes of the first `count` entries, after validating each of them.
pub fn read_prefix(path: impl AsRef<Path>, count: u64) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut reader = WalReader::new(path)?;
    for _ in 0..count {
        match reader.next() {
            Some(entry) => {
                entry?;
            }
            None => return Err(PersistenceError::Truncated { offset: reader.offset() }),
        }
    }

    let mut bytes = Vec::with_capacity(reader.offset() as usize);
    File::open(path)?.take(reader.offset()).read_to_end(&mut bytes)?;
    Ok(bytes)
}
