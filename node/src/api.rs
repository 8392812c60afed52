// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use rootledger_kernel::event::Notification;
use rootledger_kernel::state::registry::Distribution;
use rootledger_kernel::state::series::EpochSeries;
use rootledger_kernel::types::Commitment;
use serde::{Deserialize, Serialize};

use crate::engine::{PublishReceipt, SnapshotInfo};
use crate::errors::EngineError;

/// Parses a hex root, with or without `0x`.
pub fn parse_root(s: &str) -> Result<Commitment, EngineError> {
    s.parse()
        .map_err(|e| EngineError::InvalidInput(format!("root: {}", e)))
}

#[derive(Deserialize)]
pub struct CreateDistributionRequest {
    pub epoch_length: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize)]
pub struct CreateDistributionResponse {
    pub id: u64,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    /// 32-byte commitment, hex encoded.
    pub root: String,
    pub end_timestamp: u64,
}

#[derive(Serialize, Deserialize)]
pub struct PublishResponse {
    pub distribution: Option<u64>,
    pub end_timestamp: u64,
    pub height: u64,
    pub next_end_timestamp: Option<u64>,
}

impl From<PublishReceipt> for PublishResponse {
    fn from(r: PublishReceipt) -> Self {
        Self {
            distribution: r.series.distribution_id().map(|id| id.0),
            end_timestamp: r.end_timestamp.as_secs(),
            height: r.height,
            next_end_timestamp: r.next_end_timestamp.map(|t| t.as_secs()),
        }
    }
}

#[derive(Deserialize)]
pub struct AtQuery {
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub root: String,
}

impl From<Commitment> for RootResponse {
    fn from(root: Commitment) -> Self {
        Self { root: root.to_hex() }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SeriesResponse {
    pub epoch_length: u64,
    pub first_published: Option<u64>,
    pub last_updated: u64,
    pub root_count: u64,
    pub next_end_timestamp: Option<u64>,
}

impl From<&EpochSeries> for SeriesResponse {
    fn from(s: &EpochSeries) -> Self {
        Self {
            epoch_length: s.epoch_length(),
            first_published: s.first_published().map(|t| t.as_secs()),
            last_updated: s.last_updated().as_secs(),
            root_count: s.len() as u64,
            next_end_timestamp: s.next_end_timestamp().map(|t| t.as_secs()),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct DistributionResponse {
    pub id: u64,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub series: SeriesResponse,
}

impl From<&Distribution> for DistributionResponse {
    fn from(d: &Distribution) -> Self {
        Self {
            id: d.id().0,
            owner: d.owner().as_str().to_string(),
            name: d.metadata().name.clone(),
            description: d.metadata().description.clone(),
            series: SeriesResponse::from(d.series()),
        }
    }
}

/// One line of `/v1/events/stream`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationView {
    DistributionCreated {
        id: u64,
        owner: String,
        epoch_length: u64,
    },
    RootPublished {
        distribution: Option<u64>,
        root: String,
        end_timestamp: u64,
    },
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        match n {
            Notification::DistributionCreated { id, owner, epoch_length } => {
                NotificationView::DistributionCreated {
                    id: id.0,
                    owner: owner.as_str().to_string(),
                    epoch_length: *epoch_length,
                }
            }
            Notification::RootPublished { distribution, root, end_timestamp } => {
                NotificationView::RootPublished {
                    distribution: distribution.map(|id| id.0),
                    root: root.to_hex(),
                    end_timestamp: end_timestamp.as_secs(),
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SnapshotSaveResponse {
    pub success: bool,
    pub path: String,
    pub event_index: u64,
    pub size_bytes: u64,
}

impl From<SnapshotInfo> for SnapshotSaveResponse {
    fn from(info: SnapshotInfo) -> Self {
        Self {
            success: true,
            path: info.path.to_string_lossy().to_string(),
            event_index: info.event_index,
            size_bytes: info.size_bytes,
        }
    }
}
