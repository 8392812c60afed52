// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! rootledger-kernel: a deterministic, no_std registry of epoch-sequenced
//! commitment roots.
//!
//! The kernel owns three pieces of logic:
//! - [`state::series::EpochSeries`]: the per-series continuity state machine
//! - [`indexer`]: timestamp to epoch-slot arithmetic
//! - [`state::registry::Registry`]: the default series plus owned distributions
//!
//! Everything else (clock, authorization, notification, durability) is a
//! collaborator described in [`collab`] or lives in the node crate.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod config;
pub mod error;
pub mod types;
pub mod indexer;
pub mod state;
pub mod event;
pub mod collab;
pub mod verify;
pub mod proof;
pub mod replay;
pub mod snapshot;

#[cfg(test)]
pub mod tests;
