// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Proof - Audit Trail Generation
//!
//! Binds the raw event log (canonical truth) to the ledger state it
//! produces. An auditor holding the log recomputes both hashes offline.
//!
//! # Guarantee
//! Same events → Same proof (across any architecture)

use rootledger_kernel::config::KERNEL_VERSION;
use rootledger_kernel::proof::LedgerProof;
use rootledger_kernel::state::registry::Registry;
use rootledger_kernel::verify::{event_log_hash, ledger_state_hash};
use serde::Serialize;
use std::path::Path;

/// Hashes the log at `log_path` and pairs it with the live state.
///
/// `event_count` must be the number of entries behind `registry`; the
/// caller holds the engine lock so the file cannot grow in between.
pub fn build_ledger_proof(
    log_path: &Path,
    registry: &Registry,
    event_count: u64,
) -> std::io::Result<LedgerProof> {
    let bytes = std::fs::read(log_path)?;
    let proof = LedgerProof {
        kernel_version: KERNEL_VERSION,
        event_count,
        event_log_hash: event_log_hash(&bytes),
        state_hash: ledger_state_hash(registry),
    };
    metrics::increment_counter!("rootledger_proofs_generated_total");
    Ok(proof)
}

/// Hex form of [`LedgerProof`] served at `/v1/proof/ledger`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LedgerProofView {
    pub kernel_version: u64,
    pub event_count: u64,
    pub event_log_hash: String,
    pub state_hash: String,
}

impl From<&LedgerProof> for LedgerProofView {
    fn from(p: &LedgerProof) -> Self {
        Self {
            kernel_version: p.kernel_version,
            event_count: p.event_count,
            event_log_hash: hex::encode(p.event_log_hash),
            state_hash: hex::encode(p.state_hash),
        }
    }
}
