// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sample ledgers on disk for CLI and node tests.

use crate::error::{PersistenceError, Result};
use crate::snapshot::{self, SnapshotHeader};
use crate::wal::WalWriter;

use rootledger_kernel::collab::NoopObserver;
use rootledger_kernel::error::KernelError;
use rootledger_kernel::event::LedgerEvent;
use rootledger_kernel::snapshot::encode::encode_registry;
use rootledger_kernel::state::registry::{DistributionMetadata, Registry};
use rootledger_kernel::types::{Commitment, DistributionId, Principal, SeriesKey, Timestamp};
use rootledger_kernel::verify::ledger_state_hash;

use std::fs;
use std::path::{Path, PathBuf};

pub const FIXTURE_DEFAULT_EPOCH: u64 = 3_600;

pub struct FixturePaths {
    pub log: PathBuf,
    pub snapshot: PathBuf,
    /// Entries in the log, genesis included.
    pub event_count: u64,
    /// Log entry id folded into the snapshot.
    pub snapshot_index: u64,
    /// Ledger hash after replaying the whole log.
    pub final_state_hash: [u8; 32],
}

fn kernel_err(e: KernelError) -> PersistenceError {
    PersistenceError::InvalidFormat(e.to_string())
}

struct Recorder {
    registry: Registry,
    wal: WalWriter,
}

impl Recorder {
    fn commit(&mut self, event: LedgerEvent) -> Result<u64> {
        self.registry.check_event(&event).map_err(kernel_err)?;
        let id = self.wal.append(&event.to_bytes().map_err(kernel_err)?)?;
        self.registry.commit(&event, &NoopObserver).map_err(kernel_err)?;
        Ok(id)
    }

    fn create(&mut self, owner: &str, epoch_length: u64, name: &str) -> Result<u64> {
        let event = self
            .registry
            .prepare_create(Principal::new(owner), epoch_length, DistributionMetadata::new(name, ""))
            .map_err(kernel_err)?;
        self.commit(event)
    }

    fn publish(&mut self, key: SeriesKey, label: &str, end: u64) -> Result<u64> {
        let event = self
            .registry
            .prepare_publish(key, Commitment::digest(label.as_bytes()), Timestamp(end), Timestamp(u64::MAX))
            .map_err(kernel_err)?;
        self.commit(event)
    }
}

/// Writes `ledger.log` and `ledger.snap` into `dir`.
///
/// - default series: hourly, 3 roots ending at 3600, 7200, 10800
/// - distribution 0 (`treasury`, daily): 2 roots ending at 86400, 172800
/// - distribution 1 (`ops`, 10 minutes): 5 roots ending at 600..=3000
///
/// The snapshot captures state after the first 5 entries.
pub fn generate_ledger_scenario(dir: &Path) -> Result<FixturePaths> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let log_path = dir.join("ledger.log");
    let snapshot_path = dir.join("ledger.snap");

    let registry = Registry::new(FIXTURE_DEFAULT_EPOCH).map_err(kernel_err)?;
    let mut wal = WalWriter::open(&log_path)?;
    wal.append(&registry.genesis().to_bytes().map_err(kernel_err)?)?;
    let mut rec = Recorder { registry, wal };

    rec.create("treasury", 86_400, "daily-rewards")?;
    rec.create("ops", 600, "ops-feed")?;
    rec.publish(SeriesKey::Default, "default-1", 3_600)?;
    let snapshot_index = rec.publish(SeriesKey::Distribution(DistributionId(0)), "treasury-1", 86_400)?;

    let body = encode_registry(&rec.registry).map_err(kernel_err)?;
    let header = SnapshotHeader::new(
        snapshot_index,
        1_700_000_000,
        ledger_state_hash(&rec.registry),
        snapshot::log_prefix_hash(&log_path, snapshot_index)?,
        &body,
    );
    snapshot::write_to(&snapshot_path, &header, &body)?;

    rec.publish(SeriesKey::Default, "default-2", 7_200)?;
    rec.publish(SeriesKey::Distribution(DistributionId(0)), "treasury-2", 172_800)?;
    for i in 1..=5u64 {
        rec.publish(SeriesKey::Distribution(DistributionId(1)), &format!("ops-{}", i), 600 * i)?;
    }
    rec.publish(SeriesKey::Default, "default-3", 10_800)?;

    Ok(FixturePaths {
        log: log_path,
        snapshot: snapshot_path,
        event_count: rec.wal.entry_count(),
        snapshot_index,
        final_state_hash: ledger_state_hash(&rec.registry),
    })
}
