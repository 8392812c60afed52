// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger state.

pub mod series;
pub mod registry;

pub use registry::{Distribution, DistributionMetadata, Registry};
pub use series::EpochSeries;
