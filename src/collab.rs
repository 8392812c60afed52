// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Collaborator contracts.
//!
//! The kernel never reads a clock, decides who may publish, or talks to a
//! transport on its own. It asks these traits instead.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::event::Notification;
use crate::state::registry::Distribution;
use crate::types::id::Principal;
use crate::types::time::Timestamp;

/// Monotonic source of the current time. Only used to reject premature publishes.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Capability predicate consulted before every distribution-scoped publish.
pub trait Authorizer {
    fn is_authorized(&self, caller: &Principal, distribution: &Distribution) -> bool;
}

/// Receives exactly one notification per committed creation or publish.
pub trait Observer {
    fn notify(&self, notification: &Notification);
}

/// Only the distribution's owner may publish into it.
#[derive(Clone, Copy, Debug, Default)]
pub struct OwnerOnly;

impl Authorizer for OwnerOnly {
    fn is_authorized(&self, caller: &Principal, distribution: &Distribution) -> bool {
        caller == distribution.owner()
    }
}

/// Observer that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&self, _notification: &Notification) {}
}

/// Manually driven clock for tests and offline replay tooling.
#[derive(Debug, Default)]
pub struct FixedClock {
    secs: AtomicU64,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self { secs: AtomicU64::new(now.as_secs()) }
    }

    pub fn set(&self, now: Timestamp) {
        self.secs.store(now.as_secs(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.secs.load(Ordering::SeqCst))
    }
}
