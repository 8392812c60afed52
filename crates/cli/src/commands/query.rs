// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::anyhow;
use std::path::Path;

use rootledger_kernel::types::{Commitment, DistributionId, SeriesKey, Timestamp};

use crate::engine::ForensicEngine;

/// Replays the log and answers `latest` (no `at`) or `at(timestamp)` for one series.
pub fn resolve(
    log_path: &Path,
    distribution: Option<u64>,
    at: Option<u64>,
) -> anyhow::Result<Commitment> {
    let engine = ForensicEngine::replay_all(log_path)?;
    let key = match distribution {
        Some(id) => SeriesKey::Distribution(DistributionId(id)),
        None => SeriesKey::Default,
    };

    let series = engine
        .state
        .series(key)
        .map_err(|e| anyhow!("{}: {}", key, e))?;
    let root = match at {
        Some(ts) => series.at(Timestamp(ts)),
        None => series.latest(),
    };
    root.map_err(|e| anyhow!("{}: {}", key, e))
}

pub fn run(log_path: &Path, distribution: Option<u64>, at: Option<u64>) -> anyhow::Result<()> {
    let root = resolve(log_path, distribution, at)?;
    println!("{}", root);
    Ok(())
}
