//! Deterministic Replay Logic.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use crate::error::{KernelError, Result};
use crate::event::LedgerEvent;
use crate::state::registry::Registry;
use crate::verify::ledger_state_hash;

/// Rebuilds a registry from a committed event sequence.
///
/// The first event must be `Genesis`; every later event must apply cleanly
/// in order. Any inconsistency fails the whole replay.
pub fn replay_events<I>(events: I) -> Result<Registry>
where
    I: IntoIterator<Item = LedgerEvent>,
{
    let mut iter = events.into_iter();
    let genesis = iter.next().ok_or(KernelError::InvalidEvent)?;
    let mut registry = Registry::from_genesis(&genesis)?;
    replay_onto(&mut registry, iter)?;
    Ok(registry)
}

/// Applies a tail of events on top of an existing registry (snapshot + log tail).
pub fn replay_onto<I>(registry: &mut Registry, events: I) -> Result<u64>
where
    I: IntoIterator<Item = LedgerEvent>,
{
    let mut applied = 0;
    for event in events {
        registry.apply(&event)?;
        applied += 1;
    }
    Ok(applied)
}

/// Replays `events` and returns the final ledger state hash.
pub fn replay_and_hash<I>(events: I) -> Result<[u8; 32]>
where
    I: IntoIterator<Item = LedgerEvent>,
{
    let registry = replay_events(events)?;
    Ok(ledger_state_hash(&registry))
}
