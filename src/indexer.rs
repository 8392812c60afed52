// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Timestamp to epoch-slot indexing.
//!
//! Continuity guarantees that slot `i` of a series is exactly `roots[i]`, so
//! a lookup is a single floor-division over elapsed time. No per-entry
//! timestamps are stored.

use crate::error::{KernelError, Result};
use crate::types::time::Timestamp;

/// Maps `timestamp` to a slot index for a series whose first root was
/// published at `first_published` with the given `epoch_length`.
///
/// Timestamps at or before `first_published` map to slot 0: the earliest
/// root governs all time before it.
pub fn slot_index(first_published: Timestamp, epoch_length: u64, timestamp: Timestamp) -> u64 {
    debug_assert!(epoch_length > 0);
    match timestamp.checked_since(first_published) {
        None | Some(0) => 0,
        Some(elapsed) => elapsed / epoch_length,
    }
}

/// Resolves `timestamp` against a series of `published` roots.
///
/// Returns the index into the root sequence, `EmptySeries` if the series has
/// never been published to, or `OutOfRange` if the slot is past the last root.
pub fn resolve(
    first_published: Option<Timestamp>,
    epoch_length: u64,
    published: u64,
    timestamp: Timestamp,
) -> Result<usize> {
    let first = first_published.ok_or(KernelError::EmptySeries)?;
    if published == 0 {
        return Err(KernelError::EmptySeries);
    }
    let slot = slot_index(first, epoch_length, timestamp);
    if slot >= published {
        return Err(KernelError::OutOfRange { timestamp, slot, published });
    }
    Ok(slot as usize)
}

/// Start of the half-open window `[start, start + epoch_length)` that slot
/// `slot` covers.
pub fn window_start(first_published: Timestamp, epoch_length: u64, slot: u64) -> Option<Timestamp> {
    slot.checked_mul(epoch_length)
        .and_then(|offset| first_published.checked_add(offset))
}
