// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic Hashing and Verification.

use crate::state::registry::Registry;
use crate::state::series::EpochSeries;

/// Computes the BLAKE3 hash of the ledger state.
///
/// # Hash Input Structure
/// ```text
/// kernel version (u64 LE)
/// default series
/// distribution count (u64 LE)
/// for each distribution (in id order):
///   id (u64 LE)
///   owner (len u32 LE, utf-8 bytes)
///   name, description (len u32 LE, utf-8 bytes)
///   series
///
/// series:
///   epoch_length (u64 LE)
///   first_published (0 = absent, else 1 + u64 LE)
///   last_updated (u64 LE)
///   root count (u64 LE), then 32 bytes per root
/// ```
pub fn ledger_state_hash(registry: &Registry) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&crate::config::KERNEL_VERSION.to_le_bytes());
    hash_series(&mut hasher, registry.default_series());

    hasher.update(&registry.distribution_count().to_le_bytes());
    for distribution in registry.distributions() {
        hasher.update(&distribution.id().0.to_le_bytes());
        hash_str(&mut hasher, distribution.owner().as_str());
        hash_str(&mut hasher, &distribution.metadata().name);
        hash_str(&mut hasher, &distribution.metadata().description);
        hash_series(&mut hasher, distribution.series());
    }

    *hasher.finalize().as_bytes()
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u32).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_series(hasher: &mut blake3::Hasher, series: &EpochSeries) {
    hasher.update(&series.epoch_length().to_le_bytes());
    match series.first_published() {
        Some(ts) => {
            hasher.update(&[1]);
            hasher.update(&ts.as_secs().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    hasher.update(&series.last_updated().as_secs().to_le_bytes());
    hasher.update(&(series.len() as u64).to_le_bytes());
    for root in series.roots() {
        hasher.update(root.as_bytes());
    }
}

/// BLAKE3 hash of raw event log bytes, as stored on disk.
pub fn event_log_hash(log_bytes: &[u8]) -> [u8; 32] {
    blake3::hash(log_bytes).into()
}
