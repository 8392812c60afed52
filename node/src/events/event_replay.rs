// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Replay - Authoritative Recovery
//!
//! **Event Log ALWAYS wins. Snapshot is just a cache.**
//!
//! # Recovery Protocol
//! 1. Read and validate the whole event log (canonical truth)
//! 2. Load the snapshot, if one is configured and verifies
//! 3. Replay the log entries after the snapshot's `event_index`
//! 4. Otherwise replay the whole log from genesis
//!
//! # Invariants
//! - Snapshot body hash ≠ recorded state hash → discard snapshot
//! - Snapshot ahead of the log → discard snapshot
//! - Snapshot log hash ≠ hash of this log's prefix → discard snapshot
//! - Event log corrupt → fail closed

use rootledger_kernel::error::KernelError;
use rootledger_kernel::event::LedgerEvent;
use rootledger_kernel::replay::{replay_events, replay_onto};
use rootledger_kernel::snapshot::decode::decode_registry;
use rootledger_kernel::state::registry::Registry;
use rootledger_kernel::verify::ledger_state_hash;
use rootledger_persistence::error::PersistenceError;
use rootledger_persistence::snapshot::{log_prefix_hash, read_snapshot};
use rootledger_persistence::wal::WalReader;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Event log unreadable: {0}")]
    Storage(#[from] PersistenceError),

    #[error("Event {event_id} could not be decoded: {source}")]
    Deserialization {
        event_id: u64,
        #[source]
        source: KernelError,
    },

    #[error("Event log is empty")]
    EmptyLog,

    #[error("Event application failed: {0}")]
    EventApplication(#[source] KernelError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Outcome of [`recover_from_event_log`].
#[derive(Debug)]
pub struct Recovery {
    pub registry: Registry,
    /// Entries in the log, genesis included.
    pub event_count: u64,
    /// `event_index` of the snapshot the state was seeded from, if any.
    pub snapshot_index: Option<u64>,
}

/// Reads every event in the log, in commit order.
///
/// Any checksum failure, sequence gap, torn tail or undecodable payload fails
/// the whole read.
pub fn read_event_log(path: impl AsRef<Path>) -> Result<Vec<LedgerEvent>> {
    let mut events = Vec::new();
    for entry in WalReader::new(path)? {
        let entry = entry?;
        let event = LedgerEvent::from_bytes(&entry.payload).map_err(|source| {
            ReplayError::Deserialization {
                event_id: entry.event_id(),
                source,
            }
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Loads and verifies the snapshot at `path` against the log at `log_path`,
/// which holds `event_count` entries. Returns `None`, with a warning, for
/// anything unusable.
fn load_snapshot(path: &Path, log_path: &Path, event_count: u64) -> Option<(u64, Registry)> {
    if !path.exists() {
        return None;
    }

    let (header, body) = match read_snapshot(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Discarding snapshot {:?}: {}", path, e);
            return None;
        }
    };

    if header.event_index == 0 || header.event_index > event_count {
        tracing::warn!(
            "Discarding snapshot {:?}: covers event {} but log has {}",
            path,
            header.event_index,
            event_count
        );
        return None;
    }

    match log_prefix_hash(log_path, header.event_index) {
        Ok(hash) if hash == header.log_hash => {}
        Ok(_) => {
            tracing::warn!("Discarding snapshot {:?}: taken from a different event log", path);
            return None;
        }
        Err(e) => {
            tracing::warn!("Discarding snapshot {:?}: {}", path, e);
            return None;
        }
    }

    let registry = match decode_registry(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Discarding snapshot {:?}: {}", path, e);
            return None;
        }
    };

    if ledger_state_hash(&registry) != header.state_hash {
        tracing::warn!("Discarding snapshot {:?}: state hash mismatch", path);
        return None;
    }

    Some((header.event_index, registry))
}

/// Full recovery from event log, optionally seeded from a snapshot.
pub fn recover_from_event_log(
    log_path: impl AsRef<Path>,
    snapshot_path: Option<&Path>,
) -> Result<Recovery> {
    let log_path = log_path.as_ref();
    let start = Instant::now();
    tracing::info!("Starting recovery from event log: {:?}", log_path);

    let events = read_event_log(log_path)?;
    let event_count = events.len() as u64;
    if event_count == 0 {
        return Err(ReplayError::EmptyLog);
    }
    tracing::info!("Loaded {} events from log", event_count);

    let genesis = Registry::from_genesis(&events[0]).map_err(ReplayError::EventApplication)?;

    let seeded = snapshot_path
        .and_then(|p| load_snapshot(p, log_path, event_count))
        .filter(|(_, registry)| {
            let matches = registry.default_series().epoch_length()
                == genesis.default_series().epoch_length();
            if !matches {
                tracing::warn!("Discarding snapshot: default epoch length disagrees with genesis");
            }
            matches
        });

    let (registry, snapshot_index) = match seeded {
        Some((index, mut registry)) => {
            let tail = events.into_iter().skip(index as usize);
            match replay_onto(&mut registry, tail) {
                Ok(applied) => {
                    tracing::info!("Snapshot at event {} + {} tail events replayed", index, applied);
                    (registry, Some(index))
                }
                Err(e) => {
                    tracing::warn!("Snapshot tail replay failed ({}), falling back to full replay", e);
                    let events = read_event_log(log_path)?;
                    (replay_events(events).map_err(ReplayError::EventApplication)?, None)
                }
            }
        }
        None => (replay_events(events).map_err(ReplayError::EventApplication)?, None),
    };

    let elapsed = start.elapsed().as_secs_f64();
    metrics::histogram!("rootledger_replay_duration_seconds", elapsed);
    tracing::info!(
        "Replay complete in {:.3}s. State hash: {}",
        elapsed,
        hex::encode(&ledger_state_hash(&registry)[..8])
    );

    Ok(Recovery {
        registry,
        event_count,
        snapshot_index,
    })
}
