// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Wall clock for the publish gate.

use rootledger_kernel::collab::Clock;
use rootledger_kernel::types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix-seconds clock that never goes backwards, even if the host clock is
/// stepped back.
#[derive(Debug, Default)]
pub struct SystemClock {
    high_water: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn wall_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn observe(&self, secs: u64) -> Timestamp {
        let previous = self.high_water.fetch_max(secs, Ordering::SeqCst);
        Timestamp(previous.max(secs))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.observe(Self::wall_secs())
    }
}
