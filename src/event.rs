// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger events: the canonical language for state transitions.
//!
//! Every successful mutation of a [`Registry`](crate::state::registry::Registry)
//! is expressed as exactly one `LedgerEvent`. Replaying the committed events
//! in order from genesis reproduces the registry bit for bit.
//!
//! # Determinism
//! - Events carry the `end_timestamp` being published, never the wall clock
//!   at which it was accepted
//! - Distribution ids are carried explicitly and must be sequential on replay

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::state::registry::DistributionMetadata;
use crate::types::commitment::Commitment;
use crate::types::id::{DistributionId, Principal, SeriesKey};
use crate::types::time::Timestamp;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerEvent {
    /// First event of every log. Fixes the default series' epoch length.
    Genesis {
        kernel_version: u64,
        default_epoch_length: u64,
    },

    /// A new distribution with an empty series.
    DistributionCreated {
        id: DistributionId,
        owner: Principal,
        epoch_length: u64,
        metadata: DistributionMetadata,
    },

    /// A root appended to a series.
    RootPublished {
        series: SeriesKey,
        root: Commitment,
        end_timestamp: Timestamp,
    },
}

impl LedgerEvent {
    /// Returns a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Genesis { .. } => "Genesis",
            LedgerEvent::DistributionCreated { .. } => "DistributionCreated",
            LedgerEvent::RootPublished { .. } => "RootPublished",
        }
    }

    /// What observers are told once this event has committed. Genesis is silent.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            LedgerEvent::Genesis { .. } => None,
            LedgerEvent::DistributionCreated { id, owner, epoch_length, .. } => {
                Some(Notification::DistributionCreated {
                    id: *id,
                    owner: owner.clone(),
                    epoch_length: *epoch_length,
                })
            }
            LedgerEvent::RootPublished { series, root, end_timestamp } => {
                Some(Notification::RootPublished {
                    distribution: series.distribution_id(),
                    root: *root,
                    end_timestamp: *end_timestamp,
                })
            }
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|_| KernelError::Codec)
    }

    /// Decodes one event. Trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (event, read): (LedgerEvent, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|_| KernelError::Codec)?;
        if read != bytes.len() {
            return Err(KernelError::Codec);
        }
        Ok(event)
    }
}

/// Observer payload: `(root, end_timestamp[, distribution_id])` for publishes,
/// identity and owner for creations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    DistributionCreated {
        id: DistributionId,
        owner: Principal,
        epoch_length: u64,
    },
    RootPublished {
        distribution: Option<DistributionId>,
        root: Commitment,
        end_timestamp: Timestamp,
    },
}
