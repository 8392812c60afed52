// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::path::Path;

use rootledger_kernel::state::series::EpochSeries;
use rootledger_kernel::verify::ledger_state_hash;
use rootledger_persistence::snapshot;

use super::format_ts;
use crate::engine::ForensicEngine;

#[derive(Debug, Serialize)]
pub struct SeriesSummary {
    pub series: String,
    pub owner: Option<String>,
    pub name: Option<String>,
    pub epoch_length: u64,
    pub roots: u64,
    pub first_published: Option<u64>,
    pub last_updated: u64,
}

#[derive(Debug, Serialize)]
pub struct LedgerSummary {
    pub event_count: u64,
    pub state_hash: String,
    pub series: Vec<SeriesSummary>,
}

fn summarize_series(label: String, owner: Option<String>, name: Option<String>, s: &EpochSeries) -> SeriesSummary {
    SeriesSummary {
        series: label,
        owner,
        name,
        epoch_length: s.epoch_length(),
        roots: s.len() as u64,
        first_published: s.first_published().map(|t| t.as_secs()),
        last_updated: s.last_updated().as_secs(),
    }
}

/// Replays `log_path` and summarizes every series in the resulting ledger.
pub fn summarize(log_path: &Path) -> anyhow::Result<LedgerSummary> {
    let engine = ForensicEngine::replay_all(log_path)?;
    let registry = &engine.state;

    let mut series = vec![summarize_series(
        "default".to_string(),
        None,
        None,
        registry.default_series(),
    )];
    for d in registry.distributions() {
        series.push(summarize_series(
            d.id().to_string(),
            Some(d.owner().as_str().to_string()),
            Some(d.metadata().name.clone()),
            d.series(),
        ));
    }

    Ok(LedgerSummary {
        event_count: engine.current_index,
        state_hash: hex::encode(ledger_state_hash(registry)),
        series,
    })
}

pub fn run(log_path: &Path, snapshot_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let summary = summarize(log_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\nLedger Status Report");
    println!("--------------------");

    let mut files = Table::new();
    files
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Details"]);

    files.add_row(vec![
        "Event log".to_string(),
        "OK".to_string(),
        format!("{} events, state {}", summary.event_count, &summary.state_hash[..16]),
    ]);

    if let Some(s_path) = snapshot_path {
        if s_path.exists() {
            match snapshot::read_header(s_path) {
                Ok(header) => {
                    let msg = format!(
                        "Magic: {}, Ver: {}, Idx: {}, Ts: {}",
                        std::str::from_utf8(&header.magic).unwrap_or("BAD"),
                        header.version,
                        header.event_index,
                        format_ts(header.timestamp)
                    );
                    files.add_row(vec!["Snapshot", "FOUND", &msg]);
                }
                Err(e) => {
                    files.add_row(vec!["Snapshot", "CORRUPT", &e.to_string()]);
                }
            }
        } else {
            files.add_row(vec!["Snapshot", "MISSING", ""]);
        }
    }
    println!("{files}\n");

    let mut series = Table::new();
    series
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Series", "Owner", "Name", "Epoch (s)", "Roots", "First", "Last updated"]);

    for s in &summary.series {
        series.add_row(vec![
            s.series.clone(),
            s.owner.clone().unwrap_or_else(|| "-".to_string()),
            s.name.clone().unwrap_or_else(|| "-".to_string()),
            s.epoch_length.to_string(),
            s.roots.to_string(),
            s.first_published.map(format_ts).unwrap_or_else(|| "-".to_string()),
            if s.roots == 0 { "-".to_string() } else { format_ts(s.last_updated) },
        ]);
    }
    println!("{series}\n");

    Ok(())
}
