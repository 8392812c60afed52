// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Commit - The Safety Wall
//!
//! This module enforces the commit barrier semantics:
//! 1. Event validated against live state
//! 2. Event persisted to disk (fsync)
//! 3. Live state updated
//! 4. Observers notified
//!
//! If step 1 or 2 fails the live state and the log are both unchanged.
//!
//! # Invariants
//! - A rejected event never reaches the log
//! - committed = truth
//! - No partial commits
//! - Crash-symmetric recovery

use rootledger_kernel::collab::Observer;
use rootledger_kernel::error::KernelError;
use rootledger_kernel::event::{LedgerEvent, Notification};
use rootledger_kernel::state::registry::Registry;
use crate::events::event_log::{EventLogError, EventLogWriter};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Event rejected: {0}")]
    Rejected(#[source] KernelError),

    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    #[error("Kernel error during live apply: {0}")]
    LiveApply(#[source] KernelError),
}

pub type Result<T> = std::result::Result<T, CommitError>;

/// Fans committed notifications out to every `/v1/events/stream` subscriber.
#[derive(Clone, Debug)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Observer for BroadcastObserver {
    fn notify(&self, notification: &Notification) {
        // No subscribers is not an error.
        let _ = self.tx.send(notification.clone());
    }
}

/// Event committer - enforces the commit barrier
///
/// # Protocol
/// ```text
/// Event Input
/// ↓
/// 1. check_event against live registry
/// ↓
/// 2. Append to EventLog (fsync), if durable
/// ↓
/// 3. Apply to live registry
/// ↓
/// 4. Notify observer
/// ```
pub struct LedgerCommitter {
    event_log: Option<EventLogWriter>,
    live_state: Registry,
    observer: BroadcastObserver,
    committed_height: u64,
}

impl LedgerCommitter {
    /// `committed_height` counts every event behind `live_state`, genesis included.
    pub fn new(
        event_log: Option<EventLogWriter>,
        live_state: Registry,
        committed_height: u64,
        observer: BroadcastObserver,
    ) -> Self {
        Self {
            event_log,
            live_state,
            observer,
            committed_height,
        }
    }

    /// Commit an event (the ONLY way to mutate state)
    ///
    /// Returns the committed height after the event, which for a durable
    /// ledger equals the event's id in the log.
    pub fn commit_event(&mut self, event: LedgerEvent) -> Result<u64> {
        let start = Instant::now();

        // Step 1: validate. Nothing has been touched yet.
        self.live_state
            .check_event(&event)
            .map_err(CommitError::Rejected)?;

        // Step 2: persist before any in-memory change.
        if let Some(log) = self.event_log.as_mut() {
            let id = log.append(&event)?;
            debug_assert_eq!(id, self.committed_height + 1);
        }

        // Step 3 + 4: apply, then notify.
        if let Err(e) = self.live_state.commit(&event, &self.observer) {
            // check_event passed, so this is a kernel bug. The event is
            // already durable and will be applied again on recovery.
            tracing::error!("CRITICAL: live apply failed after validation: {}", e);
            return Err(CommitError::LiveApply(e));
        }
        self.committed_height += 1;

        metrics::histogram!(
            "rootledger_event_commit_duration_seconds",
            start.elapsed().as_secs_f64()
        );
        tracing::debug!(
            "Event committed: {} at height {}",
            event.event_type(),
            self.committed_height
        );
        Ok(self.committed_height)
    }

    pub fn live_state(&self) -> &Registry {
        &self.live_state
    }

    pub fn event_log(&self) -> Option<&EventLogWriter> {
        self.event_log.as_ref()
    }

    pub fn committed_height(&self) -> u64 {
        self.committed_height
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.observer.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootledger_kernel::state::registry::DistributionMetadata;
    use rootledger_kernel::types::{Commitment, DistributionId, Principal, SeriesKey, Timestamp};
    use rootledger_persistence::wal::read_all;
    use tempfile::tempdir;

    fn durable(path: &std::path::Path) -> LedgerCommitter {
        let registry = Registry::new(3600).unwrap();
        let log = EventLogWriter::open(path, &registry.genesis()).unwrap();
        LedgerCommitter::new(Some(log), registry, 1, BroadcastObserver::new(16))
    }

    fn publish(end: u64) -> LedgerEvent {
        LedgerEvent::RootPublished {
            series: SeriesKey::Default,
            root: Commitment::digest(&end.to_le_bytes()),
            end_timestamp: Timestamp(end),
        }
    }

    #[test]
    fn test_commit_persists_then_applies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut committer = durable(&path);

        assert_eq!(committer.commit_event(publish(3600)).unwrap(), 2);
        assert_eq!(committer.live_state().default_series().len(), 1);
        assert_eq!(read_all(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_rejected_event_never_reaches_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut committer = durable(&path);
        committer.commit_event(publish(3600)).unwrap();

        let err = committer.commit_event(publish(3600)).unwrap_err();
        assert!(matches!(
            err,
            CommitError::Rejected(KernelError::NonConsecutiveEpoch { .. })
        ));
        assert_eq!(committer.committed_height(), 2);
        assert_eq!(read_all(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_subscribers_see_commits_in_order() {
        let mut committer = LedgerCommitter::new(
            None,
            Registry::new(3600).unwrap(),
            1,
            BroadcastObserver::new(16),
        );
        let mut rx = committer.subscribe();

        committer
            .commit_event(LedgerEvent::DistributionCreated {
                id: DistributionId(0),
                owner: Principal::new("alice"),
                epoch_length: 60,
                metadata: DistributionMetadata::new("feed", ""),
            })
            .unwrap();
        committer.commit_event(publish(3600)).unwrap();
        // Rejected: no notification.
        let _ = committer.commit_event(publish(3600));

        assert!(matches!(
            rx.try_recv().unwrap(),
            Notification::DistributionCreated { id: DistributionId(0), .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            Notification::RootPublished { distribution: None, end_timestamp: Timestamp(3600), .. }
        ));
        assert!(rx.try_recv().is_err());
    }
}
