//! Ledger Proof Structures.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Serialize, Deserialize};

/// A receipt binding a committed event log to the ledger state it produces.
///
/// Anyone holding the log can replay it with [`crate::replay::replay_and_hash`]
/// and compare against `state_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerProof {
    /// Event and hashing schema version.
    pub kernel_version: u64,

    /// Number of committed events, genesis included.
    pub event_count: u64,

    /// BLAKE3 hash of the raw event log file.
    pub event_log_hash: [u8; 32],

    /// BLAKE3 hash of the ledger state after replaying the log.
    pub state_hash: [u8; 32],
}
