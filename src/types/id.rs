// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Sequentially allocated distribution identifier. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DistributionId(pub u64);

impl fmt::Display for DistributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller identity. The kernel only compares principals for equality.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Principal(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses one series inside the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeriesKey {
    /// The registry-owned series created at genesis.
    Default,
    Distribution(DistributionId),
}

impl SeriesKey {
    pub fn distribution_id(&self) -> Option<DistributionId> {
        match self {
            SeriesKey::Default => None,
            SeriesKey::Distribution(id) => Some(*id),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Default => f.write_str("default"),
            SeriesKey::Distribution(id) => write!(f, "distribution:{}", id),
        }
    }
}
