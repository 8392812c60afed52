// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{bail, Context};
use std::path::Path;

use rootledger_kernel::verify::ledger_state_hash;
use rootledger_persistence::snapshot;

use crate::engine::ForensicEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub event_count: u64,
    pub state_hash: [u8; 32],
    /// `event_index` of the snapshot, when one was checked.
    pub snapshot_index: Option<u64>,
}

/// Replays the whole log, then, if given, checks that the snapshot's stored
/// hash matches its body, that it was taken from this log, and that
/// snapshot + tail replay lands on the same state.
pub fn check(log_path: &Path, snapshot_path: Option<&Path>) -> anyhow::Result<VerifyReport> {
    let full = ForensicEngine::replay_all(log_path)?;
    let state_hash = ledger_state_hash(&full.state);

    let mut snapshot_index = None;
    if let Some(s_path) = snapshot_path {
        let header = snapshot::read_header(s_path)?;
        let mut from_snapshot = ForensicEngine::from_snapshot(s_path)?;

        let stored = header.state_hash;
        let computed = ledger_state_hash(&from_snapshot.state);
        if stored != computed {
            bail!(
                "Snapshot state hash mismatch: stored {}, computed {}",
                hex::encode(stored),
                hex::encode(computed)
            );
        }

        let log_hash = snapshot::log_prefix_hash(log_path, header.event_index)
            .context("Snapshot covers events missing from the log")?;
        if log_hash != header.log_hash {
            bail!(
                "Snapshot at event {} was not taken from this log",
                header.event_index
            );
        }

        from_snapshot.replay_to(log_path, u64::MAX)?;
        from_snapshot.ensure_reached(full.current_index)?;
        if ledger_state_hash(&from_snapshot.state) != state_hash {
            bail!(
                "Snapshot at event {} plus log tail diverges from full replay",
                header.event_index
            );
        }
        snapshot_index = Some(header.event_index);
    }

    Ok(VerifyReport {
        event_count: full.current_index,
        state_hash,
        snapshot_index,
    })
}

pub fn run(log_path: &Path, snapshot_path: Option<&Path>) -> anyhow::Result<()> {
    match check(log_path, snapshot_path) {
        Ok(report) => {
            println!("\n✅ VERIFIED\n");
            println!("Events:     {}", report.event_count);
            println!("State Hash: {}", hex::encode(report.state_hash));
            if let Some(idx) = report.snapshot_index {
                println!("Snapshot:   consistent at event {}", idx);
            }
            println!();
            Ok(())
        }
        Err(e) => {
            println!("\n❌ VERIFICATION FAILED\n");
            println!("{:#}\n", e);
            Err(e)
        }
    }
}
