// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::collab::{Authorizer, NoopObserver, Observer, OwnerOnly};
use crate::error::KernelError;
use crate::event::{LedgerEvent, Notification};
use crate::state::registry::{Distribution, DistributionMetadata, Registry};
use crate::types::commitment::Commitment;
use crate::types::id::{DistributionId, Principal, SeriesKey};
use crate::types::time::Timestamp;
use core::cell::RefCell;
use std::string::String;
use std::vec::Vec;

const DAY: u64 = 86_400;

fn alice() -> Principal {
    Principal::new("alice")
}

fn bob() -> Principal {
    Principal::new("bob")
}

#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<Notification>>,
}

impl Observer for Recorder {
    fn notify(&self, notification: &Notification) {
        self.seen.borrow_mut().push(notification.clone());
    }
}

struct AllowList(Vec<Principal>);

impl Authorizer for AllowList {
    fn is_authorized(&self, caller: &Principal, _distribution: &Distribution) -> bool {
        self.0.contains(caller)
    }
}

#[test]
fn test_ids_are_sequential() {
    let mut reg = Registry::new(DAY).unwrap();
    for expected in 0..5 {
        let id = reg
            .create_distribution(alice(), 60, DistributionMetadata::default(), &NoopObserver)
            .unwrap();
        assert_eq!(id, DistributionId(expected));
    }
    assert_eq!(reg.distribution_count(), 5);
    assert_eq!(reg.next_distribution_id(), DistributionId(5));
}

#[test]
fn test_create_rejects_zero_epoch_length_without_consuming_id() {
    let mut reg = Registry::new(DAY).unwrap();
    let err = reg.create_distribution(alice(), 0, DistributionMetadata::default(), &NoopObserver).unwrap_err();
    assert_eq!(err, KernelError::InvalidConfig);
    assert_eq!(reg.next_distribution_id(), DistributionId(0));
}

#[test]
fn test_create_rejects_oversized_metadata() {
    let mut reg = Registry::new(DAY).unwrap();
    let name: String = "x".repeat(crate::config::MAX_NAME_LEN + 1);
    let err = reg
        .create_distribution(alice(), 60, DistributionMetadata::new(name, ""), &NoopObserver)
        .unwrap_err();
    assert_eq!(err, KernelError::InvalidConfig);
}

#[test]
fn test_unknown_distribution_is_not_found() {
    let mut reg = Registry::new(DAY).unwrap();
    let missing = DistributionId(3);
    assert_eq!(reg.latest(missing), Err(KernelError::NotFound(missing)));
    assert_eq!(reg.at(missing, Timestamp(1)), Err(KernelError::NotFound(missing)));
    let err = reg
        .publish(missing, &alice(), Commitment::EMPTY, Timestamp(60), Timestamp(61), &OwnerOnly, &NoopObserver)
        .unwrap_err();
    assert_eq!(err, KernelError::NotFound(missing));
}

#[test]
fn test_only_owner_may_publish() {
    let mut reg = Registry::new(DAY).unwrap();
    let id = reg.create_distribution(alice(), 60, DistributionMetadata::default(), &NoopObserver).unwrap();

    let err = reg
        .publish(id, &bob(), Commitment([1; 32]), Timestamp(60), Timestamp(61), &OwnerOnly, &NoopObserver)
        .unwrap_err();
    assert_eq!(err, KernelError::Unauthorized);
    assert!(reg.distribution(id).unwrap().series().is_empty());

    reg.publish(id, &alice(), Commitment([1; 32]), Timestamp(60), Timestamp(61), &OwnerOnly, &NoopObserver)
        .unwrap();
    assert_eq!(reg.latest(id).unwrap(), Commitment([1; 32]));
}

#[test]
fn test_authorization_policy_is_pluggable() {
    let mut reg = Registry::new(DAY).unwrap();
    let id = reg.create_distribution(alice(), 60, DistributionMetadata::default(), &NoopObserver).unwrap();
    let policy = AllowList(vec![bob()]);

    assert_eq!(reg.authorize(id, &alice(), &policy), Err(KernelError::Unauthorized));
    reg.publish(id, &bob(), Commitment([2; 32]), Timestamp(60), Timestamp(61), &policy, &NoopObserver)
        .unwrap();
}

#[test]
fn test_publishing_into_one_distribution_leaves_others_untouched() {
    let mut reg = Registry::new(DAY).unwrap();
    let a = reg.create_distribution(alice(), 60, DistributionMetadata::default(), &NoopObserver).unwrap();
    let b = reg.create_distribution(bob(), 60, DistributionMetadata::default(), &NoopObserver).unwrap();
    reg.publish(b, &bob(), Commitment([7; 32]), Timestamp(60), Timestamp(61), &OwnerOnly, &NoopObserver)
        .unwrap();
    let b_before = reg.distribution(b).unwrap().clone();
    let default_before = reg.default_series().clone();

    for i in 1..=10u64 {
        reg.publish(a, &alice(), Commitment([i as u8; 32]), Timestamp(60 * i), Timestamp(60 * i + 1), &OwnerOnly, &NoopObserver)
            .unwrap();
    }

    assert_eq!(reg.distribution(a).unwrap().series().len(), 10);
    assert_eq!(reg.distribution(b).unwrap(), &b_before);
    assert_eq!(reg.distribution(b).unwrap().series().last_updated(), Timestamp(60));
    assert_eq!(reg.default_series(), &default_before);
}

#[test]
fn test_default_series_is_independent() {
    let mut reg = Registry::new(DAY).unwrap();
    reg.publish_default(Commitment([1; 32]), Timestamp(DAY), Timestamp(DAY + 1), &NoopObserver).unwrap();
    let id = reg.create_distribution(alice(), DAY, DistributionMetadata::default(), &NoopObserver).unwrap();

    assert_eq!(reg.latest_default().unwrap(), Commitment([1; 32]));
    assert_eq!(reg.latest(id), Err(KernelError::EmptySeries));
    assert_eq!(reg.at_default(Timestamp(5)).unwrap(), Commitment([1; 32]));
}

#[test]
fn test_prepare_publish_does_not_mutate() {
    let reg = Registry::new(DAY).unwrap();
    let before = reg.clone();
    let event = reg
        .prepare_publish(SeriesKey::Default, Commitment::EMPTY, Timestamp(DAY), Timestamp(DAY + 1))
        .unwrap();
    assert_eq!(reg, before);
    assert_eq!(event.event_type(), "RootPublished");
}

#[test]
fn test_commit_notifies_once_after_apply() {
    let mut reg = Registry::new(DAY).unwrap();
    let observer = Recorder::default();

    let create = reg.prepare_create(alice(), 60, DistributionMetadata::new("weekly", "")).unwrap();
    reg.commit(&create, &observer).unwrap();

    let publish = reg
        .prepare_publish(SeriesKey::Distribution(DistributionId(0)), Commitment([3; 32]), Timestamp(60), Timestamp(61))
        .unwrap();
    reg.commit(&publish, &observer).unwrap();

    // Re-committing the same publish fails continuity and must stay silent.
    assert!(reg.commit(&publish, &observer).is_err());

    let seen = observer.seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(
        seen[1],
        Notification::RootPublished {
            distribution: Some(DistributionId(0)),
            root: Commitment([3; 32]),
            end_timestamp: Timestamp(60),
        }
    );
}

#[test]
fn test_one_shot_operations_notify_on_success_only() {
    let mut reg = Registry::new(DAY).unwrap();
    let observer = Recorder::default();

    let id = reg
        .create_distribution(alice(), 60, DistributionMetadata::new("feed", ""), &observer)
        .unwrap();
    assert!(reg
        .create_distribution(alice(), 0, DistributionMetadata::default(), &observer)
        .is_err());

    reg.publish(id, &alice(), Commitment([1; 32]), Timestamp(60), Timestamp(61), &OwnerOnly, &observer)
        .unwrap();
    assert!(reg
        .publish(id, &bob(), Commitment([2; 32]), Timestamp(120), Timestamp(121), &OwnerOnly, &observer)
        .is_err());
    assert!(reg
        .publish(id, &alice(), Commitment([2; 32]), Timestamp(60), Timestamp(121), &OwnerOnly, &observer)
        .is_err());

    reg.publish_default(Commitment([9; 32]), Timestamp(DAY), Timestamp(DAY + 1), &observer)
        .unwrap();
    assert!(reg
        .publish_default(Commitment([9; 32]), Timestamp(2 * DAY), Timestamp(DAY + 1), &observer)
        .is_err());

    let seen = observer.seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(matches!(seen[0], Notification::DistributionCreated { .. }));
    assert_eq!(
        seen[1],
        Notification::RootPublished {
            distribution: Some(id),
            root: Commitment([1; 32]),
            end_timestamp: Timestamp(60),
        }
    );
    assert_eq!(
        seen[2],
        Notification::RootPublished {
            distribution: None,
            root: Commitment([9; 32]),
            end_timestamp: Timestamp(DAY),
        }
    );
}

#[test]
fn test_apply_rejects_out_of_order_creation() {
    let mut reg = Registry::new(DAY).unwrap();
    let event = LedgerEvent::DistributionCreated {
        id: DistributionId(4),
        owner: alice(),
        epoch_length: 60,
        metadata: DistributionMetadata::default(),
    };
    assert_eq!(reg.apply(&event), Err(KernelError::InvalidEvent));
    assert_eq!(reg.apply(&reg.genesis()), Err(KernelError::InvalidEvent));
    assert_eq!(reg.distribution_count(), 0);
}
