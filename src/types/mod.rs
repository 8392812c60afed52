// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger value types.

pub mod id;
pub mod time;
pub mod commitment;

pub use commitment::Commitment;
pub use id::{DistributionId, Principal, SeriesKey};
pub use time::Timestamp;
