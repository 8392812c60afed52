// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log Writer
//!
//! This is the CANONICAL durability layer.
//! - Events are written to disk BEFORE memory application
//! - Every write is fsync'd for crash safety
//! - No truncation or rewriting allowed
//! - Bincode serialization for determinism
//!
//! # File Format
//! A checksummed WAL (see `rootledger_persistence::wal`) whose payloads are
//! bincode-encoded [`LedgerEvent`]s. Entry 1 is always `Genesis`.

use rootledger_kernel::error::KernelError;
use rootledger_kernel::event::LedgerEvent;
use rootledger_persistence::error::PersistenceError;
use rootledger_persistence::wal::{WalReader, WalWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),

    #[error("Serialization error: {0}")]
    Serialization(#[source] KernelError),

    #[error("Event log does not start with a genesis event")]
    MissingGenesis,

    #[error("Genesis mismatch: log has {found:?}, configuration expects {expected:?}")]
    GenesisMismatch {
        expected: LedgerEvent,
        found: LedgerEvent,
    },
}

pub type Result<T> = std::result::Result<T, EventLogError>;

/// Reads the first entry of the log at `path`, if any.
pub fn read_genesis(path: &Path) -> Result<Option<LedgerEvent>> {
    if !path.exists() {
        return Ok(None);
    }
    match WalReader::new(path)?.next() {
        None => Ok(None),
        Some(entry) => {
            let event = LedgerEvent::from_bytes(&entry?.payload)
                .map_err(EventLogError::Serialization)?;
            match event {
                LedgerEvent::Genesis { .. } => Ok(Some(event)),
                _ => Err(EventLogError::MissingGenesis),
            }
        }
    }
}

/// Append-Only Event Log Writer
///
/// # Safety Guarantees
/// - Write + fsync before returning
/// - Crash-safe: a torn tail refuses the next open
pub struct EventLogWriter {
    wal: WalWriter,
}

impl EventLogWriter {
    /// Opens or creates the log at `path`.
    ///
    /// A new or empty log gets `genesis` as its first entry. An existing log
    /// must already start with exactly `genesis`.
    pub fn open(path: impl AsRef<Path>, genesis: &LedgerEvent) -> Result<Self> {
        let path = path.as_ref();

        match read_genesis(path)? {
            Some(found) if &found != genesis => {
                return Err(EventLogError::GenesisMismatch {
                    expected: genesis.clone(),
                    found,
                });
            }
            _ => {}
        }

        let mut wal = WalWriter::open(path)?;
        if wal.entry_count() == 0 {
            let bytes = genesis.to_bytes().map_err(EventLogError::Serialization)?;
            wal.append(&bytes)?;
            tracing::info!("Created event log at {:?}", path);
        } else {
            tracing::info!(
                "Opened event log at {:?} with {} events",
                path,
                wal.entry_count()
            );
        }

        Ok(Self { wal })
    }

    /// Appends `event` and returns its 1-based log id once it is on disk.
    pub fn append(&mut self, event: &LedgerEvent) -> Result<u64> {
        let bytes = event.to_bytes().map_err(EventLogError::Serialization)?;
        Ok(self.wal.append(&bytes)?)
    }

    /// Entries in the log, genesis included.
    pub fn event_count(&self) -> u64 {
        self.wal.entry_count()
    }

    pub fn path(&self) -> &Path {
        self.wal.path()
    }
}
