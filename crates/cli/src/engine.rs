// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

use rootledger_kernel::event::LedgerEvent;
use rootledger_kernel::snapshot::decode::decode_registry;
use rootledger_kernel::state::registry::Registry;
use rootledger_persistence::{snapshot, wal};

/// Reads every event in the log with its log id. Fails on the first bad entry.
pub fn read_events(log_path: &Path) -> Result<Vec<(u64, LedgerEvent)>> {
    let reader = wal::read_stream(log_path)
        .with_context(|| format!("Failed to open event log {:?}", log_path))?;

    let mut events = Vec::new();
    for entry_result in reader {
        let entry = entry_result?;
        let eid = entry.event_id();
        let event = LedgerEvent::from_bytes(&entry.payload)
            .map_err(|e| anyhow!("Undecodable event {}: {}", eid, e))?;
        events.push((eid, event));
    }
    Ok(events)
}

pub struct ForensicEngine {
    pub snapshot_index: u64,
    pub current_index: u64,
    pub state: Registry,
    pub applied_events: Vec<u64>,
}

impl ForensicEngine {
    /// Starts from the genesis entry of the log at `log_path`.
    pub fn from_genesis(log_path: &Path) -> Result<Self> {
        let mut reader = wal::read_stream(log_path)
            .with_context(|| format!("Failed to open event log {:?}", log_path))?;
        let first = reader
            .next()
            .ok_or_else(|| anyhow!("Event log {:?} is empty", log_path))??;
        let genesis = LedgerEvent::from_bytes(&first.payload)
            .map_err(|e| anyhow!("Undecodable genesis: {}", e))?;
        let state = Registry::from_genesis(&genesis)
            .map_err(|e| anyhow!("Log does not start with a valid genesis: {}", e))?;

        Ok(Self {
            snapshot_index: 1,
            current_index: 1,
            state,
            applied_events: vec![1],
        })
    }

    /// Starts from a verified snapshot.
    pub fn from_snapshot(snapshot_path: &Path) -> Result<Self> {
        let (header, body) = snapshot::read_snapshot(snapshot_path)
            .context("Failed to read snapshot")?;
        let state = decode_registry(&body)
            .map_err(|e| anyhow!("Failed to load registry from snapshot: {}", e))?;

        Ok(Self {
            snapshot_index: header.event_index,
            current_index: header.event_index,
            state,
            applied_events: Vec::new(),
        })
    }

    /// Applies log entries after the starting point up to and including
    /// `target_index`. Returns how many were applied.
    pub fn replay_to(&mut self, log_path: &Path, target_index: u64) -> Result<usize> {
        let mut replayed_count = 0;
        let reader = wal::read_stream(log_path).context("Failed to open event log stream")?;

        for entry_result in reader {
            let entry = entry_result?;
            let eid = entry.event_id();

            // Already folded into the starting state.
            if eid <= self.current_index {
                continue;
            }
            if eid > target_index {
                break;
            }

            // FAIL-CLOSED: any kernel error stops replay immediately.
            let event = LedgerEvent::from_bytes(&entry.payload)
                .map_err(|e| anyhow!("Undecodable event {}: {}", eid, e))?;
            self.state
                .apply(&event)
                .map_err(|e| anyhow!("Kernel error at event {}: {}", eid, e))?;

            self.current_index = eid;
            self.applied_events.push(eid);
            replayed_count += 1;
        }

        Ok(replayed_count)
    }

    /// Replays the whole log at `log_path` from genesis.
    pub fn replay_all(log_path: &Path) -> Result<Self> {
        let mut engine = Self::from_genesis(log_path)?;
        engine.replay_to(log_path, u64::MAX)?;
        Ok(engine)
    }

    /// Replays the log and fails unless the state covers at least `min_index`.
    pub fn ensure_reached(&self, min_index: u64) -> Result<()> {
        if self.current_index < min_index {
            bail!(
                "Log ends at event {} but event {} was expected",
                self.current_index,
                min_index
            );
        }
        Ok(())
    }
}
