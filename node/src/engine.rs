// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use rootledger_kernel::collab::{Authorizer, Clock, OwnerOnly};
use rootledger_kernel::error::KernelError;
use rootledger_kernel::event::Notification;
use rootledger_kernel::proof::LedgerProof;
use rootledger_kernel::snapshot::encode::encode_registry;
use rootledger_kernel::state::registry::{Distribution, DistributionMetadata, Registry};
use rootledger_kernel::state::series::EpochSeries;
use rootledger_kernel::types::{Commitment, DistributionId, Principal, SeriesKey, Timestamp};
use rootledger_kernel::verify::ledger_state_hash;
use rootledger_persistence::snapshot::{self, SnapshotHeader};

use crate::clock::SystemClock;
use crate::config::NodeConfig;
use crate::errors::EngineError;
use crate::events::event_proof::build_ledger_proof;
use crate::events::{recover_from_event_log, BroadcastObserver, EventLogWriter, LedgerCommitter};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// What a successful publish committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub series: SeriesKey,
    pub end_timestamp: Timestamp,
    /// Committed height after the publish (its log id on a durable ledger).
    pub height: u64,
    pub next_end_timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub path: PathBuf,
    pub event_index: u64,
    pub size_bytes: u64,
}

pub struct Engine {
    committer: LedgerCommitter,
    clock: Arc<dyn Clock + Send + Sync>,
    authorizer: Box<dyn Authorizer + Send + Sync>,
    admin: Option<Principal>,
    pub snapshot_path: Option<PathBuf>,
}

impl Engine {
    /// Opens (or creates) the ledger described by `cfg` with the wall clock
    /// and owner-only publishing.
    pub fn new(cfg: &NodeConfig) -> Result<Self, EngineError> {
        Self::with_collaborators(cfg, Arc::new(SystemClock::new()), Box::new(OwnerOnly))
    }

    pub fn with_collaborators(
        cfg: &NodeConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        authorizer: Box<dyn Authorizer + Send + Sync>,
    ) -> Result<Self, EngineError> {
        cfg.validate()?;

        let fresh = Registry::new(cfg.default_epoch_length)?;
        let genesis = fresh.genesis();
        let observer = BroadcastObserver::new(cfg.event_channel_capacity);

        let committer = match &cfg.event_log_path {
            Some(path) => {
                let existing = path.exists() && std::fs::metadata(path)?.len() > 0;
                // Refuses a log whose genesis disagrees with the configuration.
                let log = EventLogWriter::open(path, &genesis)?;
                if existing {
                    let recovery = recover_from_event_log(path, cfg.snapshot_path.as_deref())?;
                    tracing::info!(
                        "Recovered {} events ({} distributions)",
                        recovery.event_count,
                        recovery.registry.distribution_count()
                    );
                    LedgerCommitter::new(Some(log), recovery.registry, recovery.event_count, observer)
                } else {
                    LedgerCommitter::new(Some(log), fresh, 1, observer)
                }
            }
            None => {
                tracing::warn!("No event log configured: ledger is in-memory only");
                LedgerCommitter::new(None, fresh, 1, observer)
            }
        };

        let admin = cfg.admin_principal.clone().map(Principal::new);
        if admin.is_none() {
            tracing::warn!("No admin principal configured: default series publishing is open");
        }

        Ok(Self {
            committer,
            clock,
            authorizer,
            admin,
            snapshot_path: cfg.snapshot_path.clone(),
        })
    }

    pub fn registry(&self) -> &Registry {
        self.committer.live_state()
    }

    pub fn committed_height(&self) -> u64 {
        self.committer.committed_height()
    }

    pub fn event_log_path(&self) -> Option<&Path> {
        self.committer.event_log().map(|log| log.path())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.committer.subscribe()
    }

    // --- Writes ---

    pub fn create_distribution(
        &mut self,
        owner: Principal,
        epoch_length: u64,
        metadata: DistributionMetadata,
    ) -> Result<DistributionId, EngineError> {
        let registry = self.committer.live_state();
        let id = registry.next_distribution_id();
        let event = registry.prepare_create(owner.clone(), epoch_length, metadata)?;
        self.committer.commit_event(event)?;

        metrics::increment_counter!("rootledger_distributions_created_total");
        tracing::info!("Distribution {} created by {} (epoch {}s)", id, owner, epoch_length);
        Ok(id)
    }

    /// Publishes into distribution `id` on behalf of `caller`.
    pub fn publish(
        &mut self,
        id: DistributionId,
        caller: &Principal,
        root: Commitment,
        end_timestamp: Timestamp,
    ) -> Result<PublishReceipt, EngineError> {
        let authorized = self
            .committer
            .live_state()
            .authorize(id, caller, &*self.authorizer);
        match authorized {
            Ok(()) => self.commit_publish(SeriesKey::Distribution(id), root, end_timestamp),
            Err(e) => Err(Self::rejected(SeriesKey::Distribution(id), e.into())),
        }
    }

    /// Publishes into the default series. Only the admin principal may do so
    /// when one is configured.
    pub fn publish_default(
        &mut self,
        caller: Option<&Principal>,
        root: Commitment,
        end_timestamp: Timestamp,
    ) -> Result<PublishReceipt, EngineError> {
        self.require_admin(caller)
            .map_err(|e| Self::rejected(SeriesKey::Default, e))?;
        self.commit_publish(SeriesKey::Default, root, end_timestamp)
    }

    /// Admits `caller` to admin-only operations. Everyone is admitted when no
    /// admin principal is configured.
    pub fn require_admin(&self, caller: Option<&Principal>) -> Result<(), EngineError> {
        match (&self.admin, caller) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(EngineError::MissingCaller),
            (Some(admin), Some(c)) if c == admin => Ok(()),
            (Some(_), Some(_)) => Err(KernelError::Unauthorized.into()),
        }
    }

    fn commit_publish(
        &mut self,
        key: SeriesKey,
        root: Commitment,
        end_timestamp: Timestamp,
    ) -> Result<PublishReceipt, EngineError> {
        let now = self.clock.now();
        let event = match self.committer.live_state().prepare_publish(key, root, end_timestamp, now) {
            Ok(event) => event,
            Err(e) => return Err(Self::rejected(key, e.into())),
        };
        let height = self
            .committer
            .commit_event(event)
            .map_err(|e| Self::rejected(key, e.into()))?;

        metrics::increment_counter!("rootledger_roots_published_total");
        tracing::info!("Root {} published to {} for epoch ending {}", root, key, end_timestamp);

        Ok(PublishReceipt {
            series: key,
            end_timestamp,
            height,
            next_end_timestamp: self.series(key)?.next_end_timestamp(),
        })
    }

    fn rejected(key: SeriesKey, err: EngineError) -> EngineError {
        metrics::increment_counter!("rootledger_publish_rejected_total", "reason" => err.kind());
        tracing::warn!("Publish to {} rejected: {}", key, err);
        err
    }

    // --- Reads ---

    pub fn distribution(&self, id: DistributionId) -> Result<&Distribution, EngineError> {
        Ok(self.registry().distribution(id)?)
    }

    pub fn series(&self, key: SeriesKey) -> Result<&EpochSeries, EngineError> {
        Ok(self.registry().series(key)?)
    }

    pub fn latest(&self, key: SeriesKey) -> Result<Commitment, EngineError> {
        Ok(self.series(key)?.latest()?)
    }

    pub fn at(&self, key: SeriesKey, timestamp: Timestamp) -> Result<Commitment, EngineError> {
        Ok(self.series(key)?.at(timestamp)?)
    }

    // --- Audit ---

    pub fn proof(&self) -> Result<LedgerProof, EngineError> {
        let path = self
            .event_log_path()
            .ok_or_else(|| EngineError::InvalidInput("Event log not enabled".to_string()))?;
        Ok(build_ledger_proof(path, self.registry(), self.committed_height())?)
    }

    pub fn state_hash(&self) -> [u8; 32] {
        ledger_state_hash(self.registry())
    }

    /// Writes a snapshot of the live registry to the configured path, tagged
    /// with the committed height and the hash of the log up to it.
    pub fn save_snapshot(&self) -> Result<SnapshotInfo, EngineError> {
        let log_path = self
            .event_log_path()
            .ok_or_else(|| EngineError::InvalidInput("Snapshots require an event log".to_string()))?;
        let path = self
            .snapshot_path
            .as_deref()
            .ok_or_else(|| EngineError::InvalidInput("No snapshot path configured".to_string()))?;

        let body = encode_registry(self.registry())?;
        let timestamp = SystemClock::new().now().as_secs();
        let event_index = self.committed_height();
        let log_hash = snapshot::log_prefix_hash(log_path, event_index)?;
        let header = SnapshotHeader::new(event_index, timestamp, self.state_hash(), log_hash, &body);
        let size_bytes = snapshot::write_to(path, &header, &body)?;

        metrics::gauge!("rootledger_snapshot_size_bytes", size_bytes as f64);
        tracing::info!("Snapshot at event {} saved to {:?} ({} bytes)", event_index, path, size_bytes);

        Ok(SnapshotInfo {
            path: path.to_path_buf(),
            event_index,
            size_bytes,
        })
    }
}
