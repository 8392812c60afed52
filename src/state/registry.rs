// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Distribution registry.
//!
//! One registry-owned default series plus a dense, append-only arena of
//! distributions where `DistributionId(i)` lives at index `i`.
//!
//! Writes come in two halves:
//! - `prepare_*` validates against current state and returns the
//!   [`LedgerEvent`] that would commit, without touching anything
//! - [`Registry::apply`] performs the mutation described by an event
//!
//! The node persists the event between the two halves. The one-shot helpers
//! (`create_distribution`, `publish`, `publish_default`) chain them for
//! in-memory use.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::collab::{Authorizer, Observer};
use crate::config::{KERNEL_VERSION, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use crate::error::{KernelError, Result};
use crate::event::LedgerEvent;
use crate::state::series::EpochSeries;
use crate::types::commitment::Commitment;
use crate::types::id::{DistributionId, Principal, SeriesKey};
use crate::types::time::Timestamp;

/// Free-text fields recorded at creation. Never interpreted by the kernel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionMetadata {
    pub name: String,
    pub description: String,
}

impl DistributionMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }

    fn validate(&self) -> Result<()> {
        if self.name.len() > MAX_NAME_LEN || self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(KernelError::InvalidConfig);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    id: DistributionId,
    owner: Principal,
    metadata: DistributionMetadata,
    series: EpochSeries,
}

impl Distribution {
    pub fn id(&self) -> DistributionId {
        self.id
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn metadata(&self) -> &DistributionMetadata {
        &self.metadata
    }

    pub fn series(&self) -> &EpochSeries {
        &self.series
    }

    pub fn epoch_length(&self) -> u64 {
        self.series.epoch_length()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    default: EpochSeries,
    distributions: Vec<Distribution>,
}

impl Registry {
    /// Creates a registry whose default series uses `default_epoch_length`.
    pub fn new(default_epoch_length: u64) -> Result<Self> {
        Ok(Self {
            default: EpochSeries::new(default_epoch_length)?,
            distributions: Vec::new(),
        })
    }

    /// Builds an empty registry from the genesis event that opens every log.
    pub fn from_genesis(event: &LedgerEvent) -> Result<Self> {
        match event {
            LedgerEvent::Genesis { kernel_version, default_epoch_length } => {
                if *kernel_version != KERNEL_VERSION {
                    return Err(KernelError::InvalidEvent);
                }
                Self::new(*default_epoch_length)
            }
            _ => Err(KernelError::InvalidEvent),
        }
    }

    /// The genesis event matching this registry's default series.
    pub fn genesis(&self) -> LedgerEvent {
        LedgerEvent::Genesis {
            kernel_version: KERNEL_VERSION,
            default_epoch_length: self.default.epoch_length(),
        }
    }

    // --- Read APIs ---

    pub fn default_series(&self) -> &EpochSeries {
        &self.default
    }

    pub fn distribution(&self, id: DistributionId) -> Result<&Distribution> {
        self.distributions
            .get(id.0 as usize)
            .ok_or(KernelError::NotFound(id))
    }

    pub fn distributions(&self) -> impl Iterator<Item = &Distribution> {
        self.distributions.iter()
    }

    pub fn distribution_count(&self) -> u64 {
        self.distributions.len() as u64
    }

    /// Identifier the next creation will receive.
    pub fn next_distribution_id(&self) -> DistributionId {
        DistributionId(self.distributions.len() as u64)
    }

    pub fn series(&self, key: SeriesKey) -> Result<&EpochSeries> {
        match key {
            SeriesKey::Default => Ok(&self.default),
            SeriesKey::Distribution(id) => self.distribution(id).map(|d| &d.series),
        }
    }

    fn series_mut(&mut self, key: SeriesKey) -> Result<&mut EpochSeries> {
        match key {
            SeriesKey::Default => Ok(&mut self.default),
            SeriesKey::Distribution(id) => self
                .distributions
                .get_mut(id.0 as usize)
                .map(|d| &mut d.series)
                .ok_or(KernelError::NotFound(id)),
        }
    }

    pub fn latest(&self, id: DistributionId) -> Result<Commitment> {
        self.distribution(id)?.series.latest()
    }

    pub fn at(&self, id: DistributionId, timestamp: Timestamp) -> Result<Commitment> {
        self.distribution(id)?.series.at(timestamp)
    }

    pub fn latest_default(&self) -> Result<Commitment> {
        self.default.latest()
    }

    pub fn at_default(&self, timestamp: Timestamp) -> Result<Commitment> {
        self.default.at(timestamp)
    }

    // --- Authorization ---

    /// Resolves `id` and asks `authorizer` whether `caller` may publish into it.
    pub fn authorize(
        &self,
        id: DistributionId,
        caller: &Principal,
        authorizer: &dyn Authorizer,
    ) -> Result<()> {
        let distribution = self.distribution(id)?;
        if !authorizer.is_authorized(caller, distribution) {
            return Err(KernelError::Unauthorized);
        }
        Ok(())
    }

    // --- Write Logic ---

    pub fn prepare_create(
        &self,
        owner: Principal,
        epoch_length: u64,
        metadata: DistributionMetadata,
    ) -> Result<LedgerEvent> {
        if epoch_length == 0 {
            return Err(KernelError::InvalidConfig);
        }
        metadata.validate()?;
        Ok(LedgerEvent::DistributionCreated {
            id: self.next_distribution_id(),
            owner,
            epoch_length,
            metadata,
        })
    }

    /// Validates a publish into `key` and returns the event to commit.
    /// Authorization is the caller's job; see [`Registry::authorize`].
    pub fn prepare_publish(
        &self,
        key: SeriesKey,
        root: Commitment,
        end_timestamp: Timestamp,
        now: Timestamp,
    ) -> Result<LedgerEvent> {
        self.series(key)?.check_publish(end_timestamp, now)?;
        Ok(LedgerEvent::RootPublished { series: key, root, end_timestamp })
    }

    /// Checks that `event` would apply cleanly, without applying it.
    pub fn check_event(&self, event: &LedgerEvent) -> Result<()> {
        match event {
            LedgerEvent::Genesis { .. } => Err(KernelError::InvalidEvent),
            LedgerEvent::DistributionCreated { id, epoch_length, metadata, .. } => {
                if *id != self.next_distribution_id() {
                    return Err(KernelError::InvalidEvent);
                }
                if *epoch_length == 0 {
                    return Err(KernelError::InvalidConfig);
                }
                metadata.validate()
            }
            LedgerEvent::RootPublished { series, end_timestamp, .. } => {
                self.series(*series)?.check_continuity(*end_timestamp)
            }
        }
    }

    /// Applies a committed event. Continuity is enforced, the clock is not.
    pub fn apply(&mut self, event: &LedgerEvent) -> Result<()> {
        self.check_event(event)?;
        match event {
            LedgerEvent::Genesis { .. } => Err(KernelError::InvalidEvent),
            LedgerEvent::DistributionCreated { id, owner, epoch_length, metadata } => {
                self.distributions.push(Distribution {
                    id: *id,
                    owner: owner.clone(),
                    metadata: metadata.clone(),
                    series: EpochSeries::new(*epoch_length)?,
                });
                Ok(())
            }
            LedgerEvent::RootPublished { series, root, end_timestamp } => {
                self.series_mut(*series)?.append(*root, *end_timestamp)
            }
        }
    }

    /// Applies `event` and, once it has committed, notifies `observer`.
    pub fn commit(&mut self, event: &LedgerEvent, observer: &dyn Observer) -> Result<()> {
        self.apply(event)?;
        if let Some(notification) = event.notification() {
            observer.notify(&notification);
        }
        Ok(())
    }

    pub fn create_distribution(
        &mut self,
        owner: Principal,
        epoch_length: u64,
        metadata: DistributionMetadata,
        observer: &dyn Observer,
    ) -> Result<DistributionId> {
        let event = self.prepare_create(owner, epoch_length, metadata)?;
        let id = self.next_distribution_id();
        self.commit(&event, observer)?;
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn publish(
        &mut self,
        id: DistributionId,
        caller: &Principal,
        root: Commitment,
        end_timestamp: Timestamp,
        now: Timestamp,
        authorizer: &dyn Authorizer,
        observer: &dyn Observer,
    ) -> Result<()> {
        self.authorize(id, caller, authorizer)?;
        let event = self.prepare_publish(SeriesKey::Distribution(id), root, end_timestamp, now)?;
        self.commit(&event, observer)
    }

    pub fn publish_default(
        &mut self,
        root: Commitment,
        end_timestamp: Timestamp,
        now: Timestamp,
        observer: &dyn Observer,
    ) -> Result<()> {
        let event = self.prepare_publish(SeriesKey::Default, root, end_timestamp, now)?;
        self.commit(&event, observer)
    }

    // --- Invariant Checker ---

    /// Checks the internal consistency of the registry, e.g. after decoding a snapshot.
    pub fn check_invariants(&self) -> Result<()> {
        self.default.check_invariants()?;
        for (i, distribution) in self.distributions.iter().enumerate() {
            if distribution.id.0 != i as u64 {
                return Err(KernelError::InvalidEvent);
            }
            distribution.metadata.validate()?;
            distribution.series.check_invariants()?;
        }
        Ok(())
    }
}
