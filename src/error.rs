// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use core::fmt;

use crate::types::id::DistributionId;
use crate::types::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Construction-time misconfiguration (zero epoch length, oversized metadata).
    InvalidConfig,
    /// The epoch being published has not ended yet.
    NotYetElapsed { end_timestamp: Timestamp, now: Timestamp },
    /// The epoch does not immediately follow the last committed one.
    NonConsecutiveEpoch { expected: Timestamp, found: Timestamp },
    /// Nothing has been published into the series.
    EmptySeries,
    /// The timestamp lies past the last published epoch.
    OutOfRange { timestamp: Timestamp, slot: u64, published: u64 },
    /// Unknown distribution.
    NotFound(DistributionId),
    /// The authorization predicate rejected the caller.
    Unauthorized,
    /// Event could not be encoded or decoded.
    Codec,
    /// A replayed event does not fit the current state.
    InvalidEvent,
}

impl KernelError {
    /// Stable machine-readable name, used in API error bodies and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            KernelError::InvalidConfig => "invalid_config",
            KernelError::NotYetElapsed { .. } => "not_yet_elapsed",
            KernelError::NonConsecutiveEpoch { .. } => "non_consecutive_epoch",
            KernelError::EmptySeries => "empty_series",
            KernelError::OutOfRange { .. } => "out_of_range",
            KernelError::NotFound(_) => "not_found",
            KernelError::Unauthorized => "unauthorized",
            KernelError::Codec => "codec",
            KernelError::InvalidEvent => "invalid_event",
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidConfig => write!(f, "invalid configuration"),
            KernelError::NotYetElapsed { end_timestamp, now } => {
                write!(f, "epoch ending at {} has not elapsed (now {})", end_timestamp, now)
            }
            KernelError::NonConsecutiveEpoch { expected, found } => {
                write!(f, "non-consecutive epoch: expected end {}, found {}", expected, found)
            }
            KernelError::EmptySeries => write!(f, "no root has been published"),
            KernelError::OutOfRange { timestamp, slot, published } => write!(
                f,
                "timestamp {} maps to slot {} but only {} roots are published",
                timestamp, slot, published
            ),
            KernelError::NotFound(id) => write!(f, "distribution {} not found", id),
            KernelError::Unauthorized => write!(f, "caller is not authorized"),
            KernelError::Codec => write!(f, "event codec failure"),
            KernelError::InvalidEvent => write!(f, "event does not apply to current state"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
