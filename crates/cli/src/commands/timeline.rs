// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use rootledger_kernel::event::LedgerEvent;
use rootledger_kernel::types::{DistributionId, SeriesKey};

use super::format_ts;
use crate::engine::read_events;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    pub event_id: u64,
    pub kind: &'static str,
    pub series: String,
    pub detail: String,
}

fn touches(event: &LedgerEvent, filter: DistributionId) -> bool {
    match event {
        LedgerEvent::Genesis { .. } => false,
        LedgerEvent::DistributionCreated { id, .. } => *id == filter,
        LedgerEvent::RootPublished { series, .. } => *series == SeriesKey::Distribution(filter),
    }
}

/// Rows for every event, or only those touching `distribution`.
pub fn rows(log_path: &Path, distribution: Option<u64>) -> anyhow::Result<Vec<TimelineRow>> {
    let filter = distribution.map(DistributionId);
    let mut out = Vec::new();

    for (event_id, event) in read_events(log_path)? {
        if let Some(f) = filter {
            if !touches(&event, f) {
                continue;
            }
        }
        let (series, detail) = match &event {
            LedgerEvent::Genesis { kernel_version, default_epoch_length } => (
                "default".to_string(),
                format!("kernel v{}, default epoch {}s", kernel_version, default_epoch_length),
            ),
            LedgerEvent::DistributionCreated { id, owner, epoch_length, metadata } => (
                id.to_string(),
                format!("owner {}, epoch {}s, {:?}", owner, epoch_length, metadata.name),
            ),
            LedgerEvent::RootPublished { series, root, end_timestamp } => (
                series.to_string(),
                format!("{} ending {}", &root.to_hex()[..16], format_ts(end_timestamp.as_secs())),
            ),
        };
        out.push(TimelineRow {
            event_id,
            kind: event.event_type(),
            series,
            detail,
        });
    }
    Ok(out)
}

pub fn run(log_path: &Path, distribution: Option<u64>) -> anyhow::Result<()> {
    let rows = rows(log_path, distribution)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Event", "Series", "Details"]);

    for row in rows {
        table.add_row(vec![
            row.event_id.to_string(),
            row.kind.to_string(),
            row.series,
            row.detail,
        ]);
    }

    println!("\nEvent Timeline\n");
    println!("{table}\n");

    Ok(())
}
