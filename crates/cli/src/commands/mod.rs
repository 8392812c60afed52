// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod inspect;
pub mod query;
pub mod timeline;
pub mod verify;

use chrono::SecondsFormat;

/// Renders unix seconds as RFC 3339, or the raw number if out of range.
pub(crate) fn format_ts(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| secs.to_string())
}
