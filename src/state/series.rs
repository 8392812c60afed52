// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Epoch series: the continuity state machine.
//!
//! A series is `Uninitialized` until its first successful publish and
//! `Active` forever after. Every publish in the `Active` state must end
//! exactly one epoch after the previous one.
//!
//! # Invariants
//! - `roots[i]` covers `[first_published + i*L, first_published + (i+1)*L)`
//! - `last_updated == first_published + (len - 1) * L` once active
//! - `roots` is append-only
//!
//! All validation happens before the first field is touched, so a failed
//! call never leaves a partial update behind.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::indexer;
use crate::types::commitment::Commitment;
use crate::types::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSeries {
    epoch_length: u64,
    first_published: Option<Timestamp>,
    last_updated: Timestamp,
    roots: Vec<Commitment>,
}

impl EpochSeries {
    /// Creates an empty series. Fails with `InvalidConfig` on a zero epoch length.
    pub fn new(epoch_length: u64) -> Result<Self> {
        if epoch_length == 0 {
            return Err(KernelError::InvalidConfig);
        }
        Ok(Self {
            epoch_length,
            first_published: None,
            last_updated: Timestamp::ZERO,
            roots: Vec::new(),
        })
    }

    // --- Read APIs ---

    pub fn epoch_length(&self) -> u64 {
        self.epoch_length
    }

    pub fn first_published(&self) -> Option<Timestamp> {
        self.first_published
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    pub fn roots(&self) -> &[Commitment] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.first_published.is_some()
    }

    /// The only `end_timestamp` the next publish may carry, once active.
    pub fn next_end_timestamp(&self) -> Option<Timestamp> {
        if self.is_active() {
            self.last_updated.checked_add(self.epoch_length)
        } else {
            None
        }
    }

    /// Half-open window `[start, end)` covered by `roots[slot]`.
    pub fn window(&self, slot: usize) -> Option<(Timestamp, Timestamp)> {
        if slot >= self.roots.len() {
            return None;
        }
        let first = self.first_published?;
        let start = indexer::window_start(first, self.epoch_length, slot as u64)?;
        let end = start.checked_add(self.epoch_length)?;
        Some((start, end))
    }

    pub fn latest(&self) -> Result<Commitment> {
        self.roots.last().copied().ok_or(KernelError::EmptySeries)
    }

    /// Root that was authoritative at `timestamp`.
    pub fn at(&self, timestamp: Timestamp) -> Result<Commitment> {
        let idx = indexer::resolve(
            self.first_published,
            self.epoch_length,
            self.roots.len() as u64,
            timestamp,
        )?;
        Ok(self.roots[idx])
    }

    // --- Write Logic ---

    /// Validates a publish without mutating anything.
    pub fn check_publish(&self, end_timestamp: Timestamp, now: Timestamp) -> Result<()> {
        if now <= end_timestamp {
            return Err(KernelError::NotYetElapsed { end_timestamp, now });
        }
        self.check_continuity(end_timestamp)
    }

    /// Continuity half of [`check_publish`](Self::check_publish). Replay uses
    /// this alone since a committed event was already checked against the clock.
    pub fn check_continuity(&self, end_timestamp: Timestamp) -> Result<()> {
        if self.is_active() {
            let consecutive = end_timestamp
                .checked_since(self.last_updated)
                .map_or(false, |gap| gap == self.epoch_length);
            if !consecutive {
                return Err(KernelError::NonConsecutiveEpoch {
                    expected: self
                        .last_updated
                        .checked_add(self.epoch_length)
                        .unwrap_or(self.last_updated),
                    found: end_timestamp,
                });
            }
        } else if end_timestamp.as_secs() < self.epoch_length {
            // The first epoch must fit entirely after the zero sentinel.
            return Err(KernelError::NonConsecutiveEpoch {
                expected: Timestamp(self.epoch_length),
                found: end_timestamp,
            });
        }
        Ok(())
    }

    /// Publishes `root` for the epoch ending at `end_timestamp`.
    pub fn publish(&mut self, root: Commitment, end_timestamp: Timestamp, now: Timestamp) -> Result<()> {
        self.check_publish(end_timestamp, now)?;
        self.commit(root, end_timestamp);
        Ok(())
    }

    /// Appends a previously committed root. Continuity is re-checked, the
    /// clock is not.
    pub fn append(&mut self, root: Commitment, end_timestamp: Timestamp) -> Result<()> {
        self.check_continuity(end_timestamp)?;
        self.commit(root, end_timestamp);
        Ok(())
    }

    fn commit(&mut self, root: Commitment, end_timestamp: Timestamp) {
        if self.first_published.is_none() {
            self.first_published = Some(end_timestamp);
        }
        self.roots.push(root);
        self.last_updated = end_timestamp;
    }

    // --- Invariant Checker ---

    /// Checks the internal consistency of a series, e.g. after decoding a snapshot.
    pub fn check_invariants(&self) -> Result<()> {
        if self.epoch_length == 0 {
            return Err(KernelError::InvalidConfig);
        }
        match self.first_published {
            None => {
                if !self.roots.is_empty() || !self.last_updated.is_zero() {
                    return Err(KernelError::InvalidEvent);
                }
            }
            Some(first) => {
                if self.roots.is_empty() {
                    return Err(KernelError::InvalidEvent);
                }
                let last_slot = (self.roots.len() - 1) as u64;
                let expected = indexer::window_start(first, self.epoch_length, last_slot)
                    .ok_or(KernelError::InvalidEvent)?;
                if expected != self.last_updated {
                    return Err(KernelError::InvalidEvent);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    fn root(n: u8) -> Commitment {
        Commitment([n; 32])
    }

    #[test]
    fn test_zero_epoch_length_rejected() {
        assert_eq!(EpochSeries::new(0), Err(KernelError::InvalidConfig));
    }

    #[test]
    fn test_new_series_is_uninitialized() {
        let s = EpochSeries::new(DAY).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.first_published(), None);
        assert_eq!(s.last_updated(), Timestamp::ZERO);
        assert_eq!(s.next_end_timestamp(), None);
        assert_eq!(s.latest(), Err(KernelError::EmptySeries));
        assert_eq!(s.at(Timestamp(123)), Err(KernelError::EmptySeries));
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_not_yet_elapsed_boundary() {
        let mut s = EpochSeries::new(DAY).unwrap();
        let err = s.publish(root(1), Timestamp(DAY), Timestamp(DAY)).unwrap_err();
        assert_eq!(err, KernelError::NotYetElapsed { end_timestamp: Timestamp(DAY), now: Timestamp(DAY) });
        assert!(s.is_empty());

        s.publish(root(1), Timestamp(DAY), Timestamp(DAY + 1)).unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_first_publish_sets_first_published() {
        let mut s = EpochSeries::new(DAY).unwrap();
        s.publish(root(1), Timestamp(3 * DAY), Timestamp(3 * DAY + 5)).unwrap();
        assert_eq!(s.first_published(), Some(Timestamp(3 * DAY)));
        assert_eq!(s.last_updated(), Timestamp(3 * DAY));
        assert_eq!(s.next_end_timestamp(), Some(Timestamp(4 * DAY)));
    }

    #[test]
    fn test_first_epoch_must_fit_after_zero() {
        let mut s = EpochSeries::new(DAY).unwrap();
        let err = s.publish(root(1), Timestamp(DAY - 1), Timestamp(DAY)).unwrap_err();
        assert!(matches!(err, KernelError::NonConsecutiveEpoch { .. }));
        assert!(!s.is_active());
    }

    #[test]
    fn test_gap_and_overlap_rejected() {
        let mut s = EpochSeries::new(DAY).unwrap();
        s.publish(root(1), Timestamp(DAY), Timestamp(10 * DAY)).unwrap();

        // Skipped epoch.
        let err = s.publish(root(2), Timestamp(3 * DAY), Timestamp(10 * DAY)).unwrap_err();
        assert_eq!(err, KernelError::NonConsecutiveEpoch { expected: Timestamp(2 * DAY), found: Timestamp(3 * DAY) });
        // Going backwards.
        let err = s.publish(root(2), Timestamp(DAY / 2), Timestamp(10 * DAY)).unwrap_err();
        assert!(matches!(err, KernelError::NonConsecutiveEpoch { .. }));

        assert_eq!(s.len(), 1);
        assert_eq!(s.last_updated(), Timestamp(DAY));
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_append_ignores_clock() {
        let mut s = EpochSeries::new(10).unwrap();
        s.append(root(1), Timestamp(10)).unwrap();
        s.append(root(2), Timestamp(20)).unwrap();
        assert!(s.append(root(3), Timestamp(40)).is_err());
        assert_eq!(s.roots(), &[root(1), root(2)]);
    }

    #[test]
    fn test_window_of_each_slot() {
        let mut s = EpochSeries::new(10).unwrap();
        for i in 1..=3u8 {
            s.append(root(i), Timestamp(100 + 10 * (i as u64 - 1))).unwrap();
        }
        assert_eq!(s.window(0), Some((Timestamp(100), Timestamp(110))));
        assert_eq!(s.window(2), Some((Timestamp(120), Timestamp(130))));
        assert_eq!(s.window(3), None);
    }

    #[test]
    fn test_invariant_checker_flags_tampering() {
        let mut s = EpochSeries::new(10).unwrap();
        s.append(root(1), Timestamp(10)).unwrap();
        s.append(root(2), Timestamp(20)).unwrap();
        s.last_updated = Timestamp(25);
        assert_eq!(s.check_invariants(), Err(KernelError::InvalidEvent));
    }
}
