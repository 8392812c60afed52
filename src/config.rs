// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

/// Version of the ledger event and hashing schema.
pub const KERNEL_VERSION: u64 = 1;

/// One day in seconds. Default epoch length for the default series.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Maximum length in bytes for a distribution name.
pub const MAX_NAME_LEN: usize = 256;

/// Maximum length in bytes for a distribution description.
pub const MAX_DESCRIPTION_LEN: usize = 4096;
