// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! On-disk formats for rootledger: the checksummed write-ahead log that
//! carries ledger events, and the snapshot file that caches a replayed
//! registry.

pub mod error;
pub mod snapshot;
pub mod wal;
pub mod fixtures;

pub use error::{PersistenceError, Result};
